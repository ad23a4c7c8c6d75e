//! Device Authorization (RFC 8628) flow orchestration.
//!
//! The provider starts the flow, hands the verification instructions to a [`DevicePrompt`],
//! then polls the token endpoint at the interval the identity provider asked for until the
//! user finishes signing in or the device code expires.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	flows::CredentialProvider,
	http::TokenHttpClient,
	oauth::{BasicFacade, DeviceAuthorization, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
};

/// Verification instructions the operator must act on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceCodePrompt {
	/// Page the user opens in a browser.
	pub verification_uri: String,
	/// Code the user types on that page.
	pub user_code: String,
	/// Display-ready instructions.
	pub message: String,
	/// How long the code stays valid.
	pub expires_in: StdDuration,
}
impl DeviceCodePrompt {
	fn from_details(details: &DeviceAuthorization) -> Self {
		let verification_uri = details.verification_uri().url().to_string();
		let user_code = details.user_code().secret().to_owned();
		let message = details.extra_fields().message.clone().unwrap_or_else(|| {
			format!(
				"To sign in, use a web browser to open the page {verification_uri} and enter the code {user_code} to authenticate."
			)
		});

		Self { verification_uri, user_code, message, expires_in: details.expires_in() }
	}
}

/// Sink that surfaces device-code instructions to the operator.
pub trait DevicePrompt
where
	Self: Send + Sync,
{
	/// Shows `prompt`; called once per flow, before polling starts.
	fn present(&self, prompt: &DeviceCodePrompt);
}

/// Writes the verification message to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrPrompt;
impl DevicePrompt for StderrPrompt {
	fn present(&self, prompt: &DeviceCodePrompt) {
		eprintln!("{}", prompt.message);
	}
}

impl<C, M> CredentialProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs the device-code grant, blocking until sign-in completes or the code expires.
	pub async fn device_code(&self, scopes: &ScopeSet) -> Result<AccessToken> {
		obs::stage(FlowKind::DeviceCode, "device_code", async move {
			self.ensure_supported(GrantType::DeviceCode)?;

			let facade: BasicFacade<C, M> = BasicFacade::from_descriptor(
				&self.descriptor,
				&self.client_id,
				None,
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;
			let details = facade.start_device_authorization(scopes).await?;
			let prompt = DeviceCodePrompt::from_details(&details);

			self.prompt.present(&prompt);

			obs::event!(
				info,
				verification_uri = %prompt.verification_uri,
				expires_in_secs = prompt.expires_in.as_secs(),
				"Waiting for device sign-in."
			);

			let token = facade.poll_device_token(&details, scopes, None).await?;

			obs::event!(info, scope = %token.scope, "Acquired delegated access token.");

			Ok(token)
		})
		.await
	}
}
