// self
use crate::_prelude::*;

/// OAuth 2.0 grant types supported by the credential provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
	/// Device Authorization grant (RFC 8628) for delegated tokens.
	DeviceCode,
}
impl GrantType {
	/// Returns the identifier used in logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::DeviceCode => "device_code",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Collection of grant flags wired into the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedGrants {
	/// Indicates whether the Client Credentials grant is enabled.
	pub client_credentials: bool,
	/// Indicates whether the Device Authorization grant is enabled.
	pub device_code: bool,
}
impl SupportedGrants {
	/// Returns true if the provided grant is supported.
	pub fn supports(self, grant: GrantType) -> bool {
		match grant {
			GrantType::ClientCredentials => self.client_credentials,
			GrantType::DeviceCode => self.device_code,
		}
	}

	/// Marks a grant as supported.
	pub fn enable(mut self, grant: GrantType) -> Self {
		match grant {
			GrantType::ClientCredentials => self.client_credentials = true,
			GrantType::DeviceCode => self.device_code = true,
		}

		self
	}

	/// Returns true when no grants are enabled.
	pub fn is_empty(self) -> bool {
		!self.client_credentials && !self.device_code
	}
}
