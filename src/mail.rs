//! Microsoft Graph `sendMail` notifier.
//!
//! Success is `202 Accepted` and nothing else; every other status becomes
//! [`SendError::Rejected`] with the raw body, unparsed.

// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, MailAddress},
	error::{SendError, TransportError},
	obs::{self, FlowKind},
	present::ContentType,
};

const TARGET: &str = "the mail send endpoint";
const TEST_SUBJECT: &str = "Test Mail from Shared Mailbox via Graph API";
const TEST_BODY: &str =
	"This mail is sent from a shared mailbox using Graph API with Application Permissions.";

/// Message handed to [`Mailer::send`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
	/// Subject line.
	pub subject: String,
	/// Body, formatted per `content_type`.
	pub body: String,
	/// Body format.
	pub content_type: ContentType,
	/// Shared mailbox the message is sent as.
	pub sender: MailAddress,
	/// Recipient addresses.
	pub recipients: Vec<MailAddress>,
	/// Whether Graph keeps a copy in the sender's Sent Items.
	pub save_to_sent_items: bool,
}
impl EmailMessage {
	/// Static plain-text message used to check mailbox permissions.
	pub fn test_message(sender: MailAddress, recipients: Vec<MailAddress>) -> Self {
		Self {
			subject: TEST_SUBJECT.into(),
			body: TEST_BODY.into(),
			content_type: ContentType::Text,
			sender,
			recipients,
			save_to_sent_items: true,
		}
	}

	fn payload(&self) -> SendMailRequest<'_> {
		SendMailRequest {
			message: MessagePayload {
				subject: &self.subject,
				body: BodyPayload { content_type: self.content_type, content: &self.body },
				to_recipients: self
					.recipients
					.iter()
					.map(|address| Recipient { email_address: EmailAddress { address } })
					.collect(),
			},
			save_to_sent_items: self.save_to_sent_items,
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
	message: MessagePayload<'a>,
	save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload<'a> {
	subject: &'a str,
	body: BodyPayload<'a>,
	to_recipients: Vec<Recipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BodyPayload<'a> {
	content_type: ContentType,
	content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
	email_address: EmailAddress<'a>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
	address: &'a MailAddress,
}

/// Graph client for the `sendMail` action.
#[derive(Clone, Debug)]
pub struct Mailer {
	http: ReqwestClient,
	graph_endpoint: Url,
}
impl Mailer {
	/// Creates a mailer for the Graph base URL (e.g. `https://graph.microsoft.com/v1.0`).
	pub fn new(http: ReqwestClient, graph_endpoint: Url) -> Self {
		Self { http, graph_endpoint }
	}

	/// Sends `message` from its sender mailbox with `token`.
	pub async fn send(&self, message: EmailMessage, token: &AccessToken) -> Result<(), SendError> {
		obs::stage(FlowKind::SendMail, "send", async move {
			let body = serde_json::to_vec(&message.payload())?;
			let response = self
				.http
				.post(self.send_url(&message.sender)?)
				.header(reqwest::header::AUTHORIZATION, token.bearer())
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.body(body)
				.send()
				.await
				.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
			let status = response.status();

			if status == StatusCode::ACCEPTED {
				obs::event!(
					info,
					sender = %message.sender,
					recipients = message.recipients.len(),
					"Mail accepted for delivery."
				);

				return Ok(());
			}

			let body = response.text().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;

			Err(SendError::Rejected { status: status.as_u16(), body })
		})
		.await
	}

	fn send_url(&self, sender: &MailAddress) -> Result<Url, SendError> {
		let mut url = self.graph_endpoint.clone();

		url.path_segments_mut()
			.map_err(|_| SendError::Endpoint { endpoint: self.graph_endpoint.to_string() })?
			.pop_if_empty()
			.extend(["users", sender.as_ref(), "sendMail"]);

		Ok(url)
	}
}
