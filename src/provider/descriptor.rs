//! Provider descriptor data structures shared by the credential flows.
//!
//! The module exposes validated metadata, a builder, and grant helpers so the flows can
//! describe the identity provider in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant helpers wired into provider descriptors.
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{_prelude::*, auth::TenantId};

/// Microsoft identity platform host used when no override is configured.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authority the endpoints hang off (`https://<identity-host>/<tenant-id>`).
	pub authority: Url,
	/// Token endpoint used for every exchange.
	pub token: Url,
	/// Device-authorization endpoint used to start the device-code flow.
	pub device_authorization: Url,
}

/// Immutable provider descriptor consumed by the credential flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided authority.
	pub fn builder(authority: Url) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(authority)
	}

	/// Descriptor for a Microsoft identity platform tenant.
	///
	/// The authority is `<host>/<tenant>`; tokens come from `<authority>/oauth2/v2.0/token`
	/// and device codes from `<authority>/oauth2/v2.0/devicecode`.
	pub fn microsoft(host: &Url, tenant: &TenantId) -> Result<Self, ProviderDescriptorError> {
		let authority = join(host, tenant)?;
		let token = join(&authority, "oauth2/v2.0/token")?;
		let device = join(&authority, "oauth2/v2.0/devicecode")?;

		Self::builder(authority)
			.token_endpoint(token)
			.device_authorization_endpoint(device)
			.support_grants([GrantType::ClientCredentials, GrantType::DeviceCode])
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
	}

	/// Checks whether the descriptor supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}
}

fn join(base: &Url, segment: &str) -> Result<Url, ProviderDescriptorError> {
	let raw = format!("{}/{}", base.as_str().trim_end_matches('/'), segment.trim_start_matches('/'));

	Url::parse(&raw).map_err(|e| ProviderDescriptorError::InvalidUrl { url: raw, reason: e.to_string() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn microsoft_descriptor_derives_endpoints_from_tenant() {
		let host = Url::parse(DEFAULT_AUTHORITY_HOST).expect("Default host should parse.");
		let tenant = TenantId::new("contoso-tenant").expect("Tenant fixture should be valid.");
		let descriptor =
			ProviderDescriptor::microsoft(&host, &tenant).expect("Descriptor should build.");

		assert_eq!(
			descriptor.endpoints.authority.as_str(),
			"https://login.microsoftonline.com/contoso-tenant"
		);
		assert_eq!(
			descriptor.endpoints.token.as_str(),
			"https://login.microsoftonline.com/contoso-tenant/oauth2/v2.0/token"
		);
		assert_eq!(
			descriptor.endpoints.device_authorization.as_str(),
			"https://login.microsoftonline.com/contoso-tenant/oauth2/v2.0/devicecode"
		);
		assert!(descriptor.supports(GrantType::ClientCredentials));
		assert!(descriptor.supports(GrantType::DeviceCode));
	}

	#[test]
	fn trailing_slash_on_host_is_tolerated() {
		let host = Url::parse("https://login.example.com/").expect("Host should parse.");
		let tenant = TenantId::new("t1").expect("Tenant fixture should be valid.");
		let descriptor =
			ProviderDescriptor::microsoft(&host, &tenant).expect("Descriptor should build.");

		assert_eq!(descriptor.endpoints.authority.as_str(), "https://login.example.com/t1");
	}
}
