//! `news-relay` command-line entry point.

// std
use std::path::PathBuf;
// crates.io
use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Report};
use tracing_subscriber::EnvFilter;
// self
use news_relay::{
	auth::ScopeSet,
	config::{self, Config, HttpConfig, IdentityConfig, MailConfig},
	directory::{self, DirectoryClient},
	flows::{CredentialProvider, Flow},
	http::{self, ReqwestHttpClient},
	mail::{EmailMessage, Mailer},
	pipeline::{Outcome, Pipeline},
	present::ContentType,
};

/// Relay the newest news item for a keyword through a shared mailbox.
#[derive(Debug, Parser)]
#[command(name = "news-relay", version, about)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Fetch one news item and mail it from the shared mailbox.
	Run {
		/// Credential flow (`client_credentials` or `device_code`); overrides `AUTH_FLOW`.
		#[arg(long)]
		flow: Option<Flow>,
		/// Mail body format (`html` or `text`); overrides `MAIL_CONTENT_TYPE`.
		#[arg(long)]
		content_type: Option<ContentType>,
		/// Search keyword; overrides `KEYWORD`.
		#[arg(long)]
		keyword: Option<String>,
	},
	/// Acquire an access token and print it.
	Token {
		/// Credential flow (`client_credentials` or `device_code`); overrides `AUTH_FLOW`.
		#[arg(long)]
		flow: Option<Flow>,
		/// Space-delimited scopes; overrides `AUTH_SCOPES` and the flow's defaults.
		#[arg(long)]
		scope: Option<ScopeSet>,
	},
	/// Send a static test mail from the shared mailbox.
	SendTest,
	/// Sign in with a device code and print the `/me` profile.
	Me,
	/// Export the directory user listing as pretty-printed JSON.
	ExportUsers {
		/// Destination file.
		#[arg(long, short, default_value = "users.json")]
		output: PathBuf,
	},
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	color_eyre::install()?;
	// A missing `.env` is fine; the process environment may already be complete.
	let _ = dotenvy::dotenv();

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	let timeout = HttpConfig::from_lookup(&config::env_lookup)?.timeout;
	let http = http::build_client(timeout)?;

	match cli.command {
		Command::Run { flow, content_type, keyword } => {
			let mut config = Config::from_lookup_with_flow(&config::env_lookup, flow)?;

			if let Some(content_type) = content_type {
				config.mail.content_type = content_type;
			}
			if let Some(keyword) = keyword {
				config.news.keyword = keyword;
			}

			println!("Searching news for `{}`.", config.news.keyword);

			match Pipeline::from_config(config, http)?.run().await {
				Outcome::Failed { at, error } =>
					return Err(Report::new(error).wrap_err(format!("Pipeline failed after `{at}`."))),
				outcome => println!("{outcome}"),
			}
		},
		Command::Token { flow, scope } => {
			let flow = match flow {
				Some(flow) => flow,
				None => env_flow()?,
			};
			let identity = IdentityConfig::from_env(flow)?;
			let provider = provider(&identity, http)?;
			let token =
				provider.acquire_token(flow, &scope.unwrap_or_else(|| identity.scopes.clone())).await?;

			println!("{}", token.secret.expose());
		},
		Command::SendTest => {
			let identity = IdentityConfig::from_env(Flow::ClientCredentials)?;
			let mail = MailConfig::from_lookup(&config::env_lookup)?;
			let token = provider(&identity, http.clone())?
				.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
				.await?;

			Mailer::new(http, mail.graph_endpoint)
				.send(EmailMessage::test_message(mail.sender, mail.recipients), &token)
				.await?;

			println!("Test mail accepted.");
		},
		Command::Me => {
			let identity = IdentityConfig::from_env(Flow::DeviceCode)?;
			let graph = MailConfig::graph_endpoint_from_lookup(&config::env_lookup)?;
			let token = provider(&identity, http.clone())?
				.acquire_token(Flow::DeviceCode, &ScopeSet::user_read())
				.await?;
			let profile = DirectoryClient::new(http, graph).fetch_profile(&token).await?;

			println!("{}", String::from_utf8_lossy(&directory::to_pretty_json(&profile)?));
		},
		Command::ExportUsers { output } => {
			let identity = IdentityConfig::from_env(Flow::ClientCredentials)?;
			let graph = MailConfig::graph_endpoint_from_lookup(&config::env_lookup)?;
			let token = provider(&identity, http.clone())?
				.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
				.await?;
			let users = DirectoryClient::new(http, graph).fetch_users(&token).await?;

			directory::export_users(&users, &output)?;

			println!("Exported the user listing to {}.", output.display());
		},
	}

	Ok(())
}

fn env_flow() -> Result<Flow> {
	Ok(config::env_lookup("AUTH_FLOW")
		.filter(|raw| !raw.trim().is_empty())
		.map(|raw| raw.parse::<Flow>())
		.transpose()?
		.unwrap_or_default())
}

fn provider(identity: &IdentityConfig, http: news_relay::reqwest::Client) -> Result<CredentialProvider> {
	Ok(CredentialProvider::from_config(identity, ReqwestHttpClient::with_client(http))?)
}
