//! Access tokens produced by the credential flows.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
};

/// Bearer token issued by the identity provider.
///
/// Tokens are never cached: each pipeline stage that needs one asks the credential provider
/// for a fresh exchange and drops the token after its single downstream call.
#[derive(Clone)]
pub struct AccessToken {
	/// Token secret; callers must avoid logging it.
	pub secret: Secret,
	/// Scopes granted by the provider, or the requested scopes when the response omits them.
	pub scope: ScopeSet,
	/// Instant the response was received.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when the provider sent one.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Builds a token issued now.
	pub fn issued_now(secret: impl Into<String>, scope: ScopeSet, expires_in: Option<Duration>) -> Self {
		let issued_at = OffsetDateTime::now_utc();

		Self {
			secret: Secret::new(secret),
			scope,
			issued_at,
			expires_at: expires_in.map(|ttl| issued_at + ttl),
		}
	}

	/// `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.secret.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
