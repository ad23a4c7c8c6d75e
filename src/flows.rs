//! Credential flows that turn the configured identity into bearer tokens.
//!
//! [`CredentialProvider::acquire_token`] performs exactly one fresh exchange per call for
//! either grant; nothing is cached between calls.

mod client_credentials;
mod device_code;

pub use device_code::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet, Secret},
	config::IdentityConfig,
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{GrantType, ProviderDescriptor},
};

/// Credential flow variants understood by the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
	/// Non-interactive app-only exchange with the client secret.
	#[default]
	ClientCredentials,
	/// Interactive device-code sign-in on behalf of a user.
	DeviceCode,
}
impl Flow {
	/// Grant type driving this flow.
	pub const fn grant(self) -> GrantType {
		match self {
			Flow::ClientCredentials => GrantType::ClientCredentials,
			Flow::DeviceCode => GrantType::DeviceCode,
		}
	}

	/// Scopes requested when none are configured: the Graph `.default` scope for app-only
	/// tokens, `User.Read` for interactive sign-in.
	pub fn default_scopes(self) -> ScopeSet {
		match self {
			Flow::ClientCredentials => ScopeSet::graph_default(),
			Flow::DeviceCode => ScopeSet::user_read(),
		}
	}

	/// Returns the label accepted by [`FromStr`].
	pub const fn as_str(self) -> &'static str {
		self.grant().as_str()
	}
}
impl Display for Flow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Flow {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"client_credentials" => Ok(Flow::ClientCredentials),
			"device_code" => Ok(Flow::DeviceCode),
			other => Err(ConfigError::invalid(
				"AUTH_FLOW",
				format!("expected `client_credentials` or `device_code`, got `{other}`"),
			)),
		}
	}
}

/// Exchanges the configured application identity for bearer tokens.
///
/// The provider owns the HTTP client, descriptor, and client credentials so each flow only
/// deals with grant-specific logic. The client secret is only ever sent by the
/// client-credentials flow; the device-code flow authenticates as a public client.
#[derive(Clone)]
pub struct CredentialProvider<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound identity-provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Descriptor that defines the token and device-authorization endpoints.
	pub descriptor: ProviderDescriptor,
	/// Application (client) identifier used in every grant.
	pub client_id: ClientId,
	client_secret: Option<Secret>,
	prompt: Arc<dyn DevicePrompt>,
}
impl<C, M> CredentialProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client_id: ClientId,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			client_id,
			client_secret: None,
			prompt: Arc::new(StderrPrompt),
		}
	}

	/// Sets or replaces the client secret used by the client-credentials flow.
	pub fn with_client_secret(mut self, secret: Secret) -> Self {
		self.client_secret = Some(secret);

		self
	}

	/// Replaces the sink that shows device-code instructions to the operator.
	pub fn with_prompt(mut self, prompt: impl 'static + DevicePrompt) -> Self {
		self.prompt = Arc::new(prompt);

		self
	}

	/// Performs one fresh token exchange for `scopes` using `flow`.
	pub async fn acquire_token(&self, flow: Flow, scopes: &ScopeSet) -> Result<AccessToken> {
		match flow {
			Flow::ClientCredentials => self.client_credentials(scopes).await,
			Flow::DeviceCode => self.device_code(scopes).await,
		}
	}

	fn ensure_supported(&self, grant: GrantType) -> Result<(), ConfigError> {
		if self.descriptor.supports(grant) {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedGrant { grant: grant.as_str() })
		}
	}
}
impl CredentialProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds a provider for the Microsoft identity platform tenant in `identity`.
	pub fn from_config(identity: &IdentityConfig, http_client: ReqwestHttpClient) -> Result<Self> {
		let descriptor = ProviderDescriptor::microsoft(&identity.authority_host, &identity.tenant_id)
			.map_err(ConfigError::from)?;
		let provider = Self::with_http_client(
			descriptor,
			identity.client_id.clone(),
			http_client,
			ReqwestTransportErrorMapper,
		);

		Ok(match &identity.client_secret {
			Some(secret) => provider.with_client_secret(secret.clone()),
			None => provider,
		})
	}
}
impl<C, M> Debug for CredentialProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flow_parses_both_spellings() {
		assert_eq!("client_credentials".parse::<Flow>().ok(), Some(Flow::ClientCredentials));
		assert_eq!("Device-Code".parse::<Flow>().ok(), Some(Flow::DeviceCode));

		let err = "password".parse::<Flow>().expect_err("Unknown flows must be rejected.");

		assert!(matches!(err, ConfigError::Invalid { var: "AUTH_FLOW", .. }));
	}

	#[test]
	fn flow_labels_are_const() {
		const LABEL: &str = Flow::DeviceCode.as_str();

		assert_eq!(LABEL, GrantType::DeviceCode.as_str());
		assert_eq!(Flow::DeviceCode.default_scopes(), ScopeSet::user_read());
		assert_eq!(Flow::ClientCredentials.default_scopes(), ScopeSet::graph_default());
	}

	#[test]
	fn flow_maps_to_grant() {
		assert_eq!(Flow::default().grant(), GrantType::ClientCredentials);
		assert_eq!(Flow::DeviceCode.to_string(), "device_code");
	}
}
