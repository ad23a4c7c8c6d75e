//! Single-run driver: token, fetch, render, token, send.
//!
//! Each run walks `Idle -> TokenAcquired -> ItemFetched -> Rendered` and ends in exactly
//! one terminal [`Outcome`]. Nothing is retried and nothing is rolled back: the mail was
//! either accepted or it was not.

// self
use crate::{
	_prelude::*,
	config::{Config, IdentityConfig},
	flows::{CredentialProvider, DevicePrompt},
	http::ReqwestHttpClient,
	mail::{EmailMessage, Mailer},
	news::NewsClient,
	obs, present,
};

/// States a run moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineState {
	/// Nothing has happened yet.
	Idle,
	/// The first token exchange succeeded.
	TokenAcquired,
	/// The search returned an item.
	ItemFetched,
	/// The mail body and subject are ready.
	Rendered,
	/// The mail endpoint accepted the message.
	Sent,
	/// A stage failed.
	Failed,
	/// The search returned nothing; not an error.
	NoItem,
}
impl PipelineState {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			PipelineState::Idle => "idle",
			PipelineState::TokenAcquired => "token_acquired",
			PipelineState::ItemFetched => "item_fetched",
			PipelineState::Rendered => "rendered",
			PipelineState::Sent => "sent",
			PipelineState::Failed => "failed",
			PipelineState::NoItem => "no_item",
		}
	}

	/// Returns true for `Sent`, `Failed`, and `NoItem`.
	pub const fn is_terminal(self) -> bool {
		matches!(self, PipelineState::Sent | PipelineState::Failed | PipelineState::NoItem)
	}
}
impl Display for PipelineState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal result of one run.
#[derive(Debug)]
pub enum Outcome {
	/// The mail was accepted.
	Sent {
		/// Subject of the sent mail.
		subject: String,
	},
	/// The search had no results; nothing was sent.
	NoItem,
	/// A stage failed.
	Failed {
		/// Last state reached before the failure.
		at: PipelineState,
		/// What went wrong.
		error: Error,
	},
}
impl Outcome {
	/// Terminal state this outcome corresponds to.
	pub fn state(&self) -> PipelineState {
		match self {
			Outcome::Sent { .. } => PipelineState::Sent,
			Outcome::NoItem => PipelineState::NoItem,
			Outcome::Failed { .. } => PipelineState::Failed,
		}
	}

	/// Returns true unless the run failed.
	pub fn is_success(&self) -> bool {
		!matches!(self, Outcome::Failed { .. })
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Outcome::Sent { subject } => write!(f, "Mail sent: {subject}."),
			Outcome::NoItem => f.write_str("No news item matched; nothing was sent."),
			Outcome::Failed { at, error } => write!(f, "Run failed after `{at}`: {error}"),
		}
	}
}

/// Sequences the credential provider, news client, presenter, and mailer.
#[derive(Debug)]
pub struct Pipeline {
	config: Config,
	provider: CredentialProvider,
	news: NewsClient,
	mailer: Mailer,
}
impl Pipeline {
	/// Wires every stage to `http` using the settings in `config`.
	pub fn from_config(config: Config, http: ReqwestClient) -> Result<Self> {
		let provider =
			CredentialProvider::from_config(&config.identity, ReqwestHttpClient::with_client(http.clone()))?;
		let news = NewsClient::new(http.clone(), config.news.endpoint.clone());
		let mailer = Mailer::new(http, config.mail.graph_endpoint.clone());

		Ok(Self { config, provider, news, mailer })
	}

	/// Replaces the sink that shows device-code instructions.
	pub fn with_prompt(mut self, prompt: impl 'static + DevicePrompt) -> Self {
		self.provider = self.provider.with_prompt(prompt);

		self
	}

	/// Performs one run and reports its outcome.
	pub async fn run(&self) -> Outcome {
		let mut state = PipelineState::Idle;

		match self.drive(&mut state).await {
			Ok(Some(subject)) => {
				advance(&mut state, PipelineState::Sent);

				Outcome::Sent { subject }
			},
			Ok(None) => {
				advance(&mut state, PipelineState::NoItem);

				Outcome::NoItem
			},
			Err(error) => {
				obs::event!(error, at = %state, error = %error, "Pipeline run failed.");

				Outcome::Failed { at: state, error }
			},
		}
	}

	async fn drive(&self, state: &mut PipelineState) -> Result<Option<String>> {
		let IdentityConfig { flow, scopes, .. } = &self.config.identity;
		let flow = *flow;

		self.provider.acquire_token(flow, scopes).await?;
		advance(state, PipelineState::TokenAcquired);

		let news = &self.config.news;
		let Some(item) =
			self.news.fetch_top_result(&news.keyword, &news.market, &news.api_key).await?
		else {
			return Ok(None);
		};

		advance(state, PipelineState::ItemFetched);

		let mail = &self.config.mail;
		let subject = present::subject(&item);
		let message = EmailMessage {
			subject: subject.clone(),
			body: present::compose_body(&item, &news.keyword, mail.content_type),
			content_type: mail.content_type,
			sender: mail.sender.clone(),
			recipients: mail.recipients.clone(),
			save_to_sent_items: mail.save_to_sent_items,
		};

		advance(state, PipelineState::Rendered);

		let token = self.provider.acquire_token(flow, scopes).await?;

		self.mailer.send(message, &token).await?;

		Ok(Some(subject))
	}
}

fn advance(state: &mut PipelineState, next: PipelineState) {
	obs::event!(info, from = %state, to = %next, "Pipeline advanced.");

	*state = next;
}
