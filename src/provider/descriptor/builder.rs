// std
use std::iter::IntoIterator;
// self
use crate::{
	_prelude::*,
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor, ProviderEndpoints, SupportedGrants},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Device-code support implies a device-authorization endpoint.
	#[error("Missing device authorization endpoint.")]
	MissingDeviceAuthorizationEndpoint,
	/// At least one grant must be supported.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A derived endpoint URL could not be parsed.
	#[error("Endpoint URL `{url}` is invalid: {reason}.")]
	InvalidUrl {
		/// URL that failed to parse.
		url: String,
		/// Parser message.
		reason: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Authority the descriptor is rooted at.
	pub authority: Url,
	/// Token endpoint used for every exchange.
	pub token_endpoint: Option<Url>,
	/// Device-authorization endpoint (required for the device-code grant).
	pub device_authorization_endpoint: Option<Url>,
	/// Grants enabled for the provider.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder rooted at the provided authority.
	pub fn new(authority: Url) -> Self {
		Self {
			authority,
			token_endpoint: None,
			device_authorization_endpoint: None,
			supported_grants: SupportedGrants::default(),
			preferred_client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the device-authorization endpoint.
	pub fn device_authorization_endpoint(mut self, url: Url) -> Self {
		self.device_authorization_endpoint = Some(url);

		self
	}

	/// Marks a single grant type as supported.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Marks multiple grants as supported.
	pub fn support_grants<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		for grant in grants.into_iter() {
			self.supported_grants = self.supported_grants.enable(grant);
		}

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let device_authorization = match self.device_authorization_endpoint {
			Some(url) => url,
			None if self.supported_grants.supports(GrantType::DeviceCode) =>
				return Err(ProviderDescriptorError::MissingDeviceAuthorizationEndpoint),
			// Client-credentials-only descriptors never call it; park it on the token endpoint.
			None => token.clone(),
		};
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { authority: self.authority, token, device_authorization },
			supported_grants: self.supported_grants,
			preferred_client_auth_method: self.preferred_client_auth_method,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.supported_grants.is_empty() {
			return Err(ProviderDescriptorError::NoSupportedGrants);
		}

		validate_endpoint("authority", &self.endpoints.authority)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("device authorization", &self.endpoints.device_authorization)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
