//! Client Credentials flow orchestration.
//!
//! Every call performs a fresh app-only exchange against the token endpoint with the client
//! secret sent as form parameters; there is no cache to consult first.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	error::ConfigError,
	flows::CredentialProvider,
	http::TokenHttpClient,
	oauth::{BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
};

impl<C, M> CredentialProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs the `client_credentials` grant.
	pub async fn client_credentials(&self, scopes: &ScopeSet) -> Result<AccessToken> {
		obs::stage(FlowKind::ClientCredentials, "client_credentials", async move {
			self.ensure_supported(GrantType::ClientCredentials)?;

			let secret = self
				.client_secret
				.as_ref()
				.ok_or(ConfigError::Missing { var: "CLIENT_SECRET" })?;
			let facade: BasicFacade<C, M> = BasicFacade::from_descriptor(
				&self.descriptor,
				&self.client_id,
				Some(secret.expose()),
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;
			let token = facade.exchange_client_credentials(scopes).await?;

			obs::event!(info, scope = %token.scope, "Acquired app-only access token.");

			Ok(token)
		})
		.await
	}
}
