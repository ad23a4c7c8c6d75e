//! Relay-level error types shared across the credential flows, downstream clients, and the
//! pipeline driver.

// std
use std::path::PathBuf;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, raised before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token exchange failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// A read from a downstream API failed.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// The mail-send call failed.
	#[error(transparent)]
	Send(#[from] SendError),
	/// Writing an export artifact failed.
	#[error("Failed to write {}.", .path.display())]
	Export {
		/// Destination that could not be written.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: std::io::Error,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration value is absent or empty.
	#[error("Required configuration value `{var}` is not set.")]
	Missing {
		/// Environment variable name.
		var: &'static str,
	},
	/// A configuration value could not be interpreted.
	#[error("Configuration value `{var}` is invalid: {reason}.")]
	Invalid {
		/// Environment variable name.
		var: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// The identity descriptor does not enable the requested grant.
	#[error("The identity provider descriptor does not support the {grant} grant.")]
	UnsupportedGrant {
		/// Grant identifier.
		grant: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Identity descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptorUrl {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Identity descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Shorthand for [`ConfigError::Invalid`].
	pub fn invalid(var: &'static str, reason: impl Display) -> Self {
		Self::Invalid { var, reason: reason.to_string() }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token acquisition failures. Every variant is terminal for a pipeline run.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The identity provider answered without an access token and named an OAuth error.
	#[error("Failed to acquire token. Error: {error}, Description: {}.", .description.as_deref().unwrap_or("none"))]
	Rejected {
		/// Provider `error` code, verbatim.
		error: String,
		/// Provider `error_description`, verbatim.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The identity provider answered without an access token or an OAuth error.
	#[error("Token endpoint response did not contain an access token.")]
	MissingAccessToken {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The device-authorization request did not yield a user code.
	#[error("Device flow initiation failed: {reason}.")]
	FlowInitiation {
		/// What went wrong while starting the flow.
		reason: String,
	},
	/// The token endpoint returned something the OAuth client could not interpret.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The token call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl AuthError {
	/// Provider error code when the failure came from an OAuth error response.
	pub fn provider_error(&self) -> Option<&str> {
		match self {
			Self::Rejected { error, .. } => Some(error),
			_ => None,
		}
	}
}

/// Failures of read-only downstream calls (news search, directory, profile).
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Downstream API answered with a non-success status.
	#[error("Request failed with HTTP {status}: {body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Response body was not the expected JSON document.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure naming the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// A result lacked a field every extracted item must carry.
	#[error("Search result is missing the `{field}` field.")]
	MissingField {
		/// JSON field name.
		field: &'static str,
	},
	/// The call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Mail-send failures.
#[derive(Debug, ThisError)]
pub enum SendError {
	/// Mail endpoint answered with anything other than `202 Accepted`.
	#[error("Mail send failed with HTTP {status}: {body}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Graph endpoint cannot be extended with a mailbox path.
	#[error("Graph endpoint {endpoint} cannot carry a mailbox path.")]
	Endpoint {
		/// Configured Graph base URL.
		endpoint: String,
	},
	/// Request payload could not be serialized.
	#[error("Mail payload could not be serialized.")]
	Encode(#[from] serde_json::Error),
	/// The call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which endpoint was being called.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The per-call timeout elapsed.
	#[error("Request to {target} timed out.")]
	Timeout {
		/// Which endpoint was being called.
		target: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(target: &'static str, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { target, source: Box::new(src) }
	}

	/// Classifies a reqwest failure, separating timeouts from other network errors.
	pub fn from_reqwest(target: &'static str, e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { target } } else { Self::network(target, e) }
	}
}
