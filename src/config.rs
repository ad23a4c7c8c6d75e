//! Process configuration assembled once at startup.
//!
//! Every value comes from a key lookup (the process environment in production, a closure in
//! tests) and is validated before any network call. Components receive the parsed structs and
//! never read the environment themselves. Empty values are treated as absent.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, MailAddress, ScopeSet, Secret, TenantId},
	error::ConfigError,
	flows::Flow,
	present::ContentType,
	provider::DEFAULT_AUTHORITY_HOST,
};

/// News-search API base used when `BING_NEWS_ENDPOINT` is unset.
pub const DEFAULT_NEWS_ENDPOINT: &str = "https://api.bing.microsoft.com/";
/// Microsoft Graph base used when `GRAPH_ENDPOINT` is unset.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";
/// Search keyword used when `KEYWORD` is unset.
pub const DEFAULT_KEYWORD: &str = "生成AI";
/// Search market used when `NEWS_MARKET` is unset.
pub const DEFAULT_MARKET: &str = "ja-JP";
/// Per-call timeout used when `HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Complete configuration for a pipeline run.
#[derive(Clone, Debug)]
pub struct Config {
	/// Application identity and flow selection.
	pub identity: IdentityConfig,
	/// News-search settings.
	pub news: NewsConfig,
	/// Mail-send settings.
	pub mail: MailConfig,
	/// Transport settings.
	pub http: HttpConfig,
}
impl Config {
	/// Reads the full configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(&env_lookup)
	}

	/// Reads the full configuration through `lookup`.
	pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		Self::from_lookup_with_flow(lookup, None)
	}

	/// Like [`Config::from_lookup`], with `flow` taking precedence over `AUTH_FLOW`.
	pub fn from_lookup_with_flow<F>(lookup: &F, flow: Option<Flow>) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let flow = match flow {
			Some(flow) => flow,
			None => optional(lookup, "AUTH_FLOW")
				.map(|raw| raw.parse::<Flow>())
				.transpose()?
				.unwrap_or_default(),
		};

		Ok(Self {
			identity: IdentityConfig::from_lookup(lookup, flow)?,
			news: NewsConfig::from_lookup(lookup)?,
			mail: MailConfig::from_lookup(lookup)?,
			http: HttpConfig::from_lookup(lookup)?,
		})
	}
}

/// Tenant, application, and flow settings for the credential provider.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
	/// Directory (tenant) identifier.
	pub tenant_id: TenantId,
	/// Application (client) identifier.
	pub client_id: ClientId,
	/// Client secret; required by the client-credentials flow only.
	pub client_secret: Option<Secret>,
	/// Identity-platform host the authority is derived from.
	pub authority_host: Url,
	/// Flow used by default.
	pub flow: Flow,
	/// Scopes requested for every token; `AUTH_SCOPES` or the flow's defaults.
	pub scopes: ScopeSet,
}
impl IdentityConfig {
	/// Reads the identity settings from the process environment.
	pub fn from_env(flow: Flow) -> Result<Self, ConfigError> {
		Self::from_lookup(&env_lookup, flow)
	}

	/// Reads the identity settings through `lookup`.
	///
	/// `CLIENT_SECRET` becomes mandatory when `flow` is [`Flow::ClientCredentials`].
	pub fn from_lookup<F>(lookup: &F, flow: Flow) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let tenant_id = TenantId::new(required(lookup, "TENANT_ID")?)?;
		let client_id = ClientId::new(required(lookup, "CLIENT_ID")?)?;
		let client_secret = match flow {
			Flow::ClientCredentials => Some(Secret::new(required(lookup, "CLIENT_SECRET")?)),
			Flow::DeviceCode => optional(lookup, "CLIENT_SECRET").map(Secret::new),
		};
		let authority_host = url_or_default(lookup, "AUTHORITY_HOST", DEFAULT_AUTHORITY_HOST)?;
		let scopes = match optional(lookup, "AUTH_SCOPES") {
			Some(raw) => raw.parse().map_err(|e| ConfigError::invalid("AUTH_SCOPES", e))?,
			None => flow.default_scopes(),
		};

		Ok(Self { tenant_id, client_id, client_secret, authority_host, flow, scopes })
	}
}

/// News-search endpoint, credentials, and query defaults.
#[derive(Clone, Debug)]
pub struct NewsConfig {
	/// Subscription key sent in the `Ocp-Apim-Subscription-Key` header.
	pub api_key: Secret,
	/// Endpoint base; the search path is appended to it.
	pub endpoint: Url,
	/// Search keyword.
	pub keyword: String,
	/// Market (locale) code.
	pub market: String,
}
impl NewsConfig {
	/// Reads the news settings through `lookup`.
	pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		Ok(Self {
			api_key: Secret::new(required(lookup, "BING_NEWS_API_KEY")?),
			endpoint: url_or_default(lookup, "BING_NEWS_ENDPOINT", DEFAULT_NEWS_ENDPOINT)?,
			keyword: optional(lookup, "KEYWORD").unwrap_or_else(|| DEFAULT_KEYWORD.to_owned()),
			market: optional(lookup, "NEWS_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_owned()),
		})
	}
}

/// Shared mailbox, recipients, and body format.
#[derive(Clone, Debug)]
pub struct MailConfig {
	/// Shared mailbox the message is sent from.
	pub sender: MailAddress,
	/// Recipient addresses.
	pub recipients: Vec<MailAddress>,
	/// Microsoft Graph base URL.
	pub graph_endpoint: Url,
	/// Body format.
	pub content_type: ContentType,
	/// Whether Graph keeps a copy in the sender's Sent Items.
	pub save_to_sent_items: bool,
}
impl MailConfig {
	/// Reads the mail settings through `lookup`.
	///
	/// `RECIPIENT_EMAIL` may list several addresses separated by commas or semicolons.
	pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let sender = MailAddress::new(required(lookup, "SHARED_MAILBOX")?)?;
		let recipients = required(lookup, "RECIPIENT_EMAIL")?
			.split([',', ';'])
			.map(str::trim)
			.filter(|address| !address.is_empty())
			.map(MailAddress::new)
			.collect::<Result<Vec<_>, _>>()?;

		if recipients.is_empty() {
			return Err(ConfigError::Missing { var: "RECIPIENT_EMAIL" });
		}

		let content_type = optional(lookup, "MAIL_CONTENT_TYPE")
			.map(|raw| raw.parse::<ContentType>())
			.transpose()?
			.unwrap_or_default();

		Ok(Self {
			sender,
			recipients,
			graph_endpoint: url_or_default(lookup, "GRAPH_ENDPOINT", DEFAULT_GRAPH_ENDPOINT)?,
			content_type,
			save_to_sent_items: true,
		})
	}

	/// Graph base URL alone, for commands that never send mail.
	pub fn graph_endpoint_from_lookup<F>(lookup: &F) -> Result<Url, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		url_or_default(lookup, "GRAPH_ENDPOINT", DEFAULT_GRAPH_ENDPOINT)
	}
}

/// Transport settings shared by every outbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpConfig {
	/// Per-call timeout.
	pub timeout: StdDuration,
}
impl HttpConfig {
	/// Reads the transport settings through `lookup`.
	pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let secs = match optional(lookup, "HTTP_TIMEOUT_SECS") {
			Some(raw) => raw
				.trim()
				.parse::<u64>()
				.ok()
				.filter(|secs| *secs > 0)
				.ok_or_else(|| ConfigError::invalid("HTTP_TIMEOUT_SECS", "expected a positive number of seconds"))?,
			None => DEFAULT_HTTP_TIMEOUT_SECS,
		};

		Ok(Self { timeout: StdDuration::from_secs(secs) })
	}
}
impl Default for HttpConfig {
	fn default() -> Self {
		Self { timeout: StdDuration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS) }
	}
}

/// Process-environment lookup; non-UTF-8 values count as unset.
pub fn env_lookup(key: &str) -> Option<String> {
	std::env::var(key).ok()
}

fn optional<F>(lookup: &F, var: &'static str) -> Option<String>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(var).filter(|value| !value.trim().is_empty())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	optional(lookup, var).ok_or(ConfigError::Missing { var })
}

fn url_or_default<F>(lookup: &F, var: &'static str, default: &str) -> Result<Url, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = optional(lookup, var).unwrap_or_else(|| default.to_owned());

	Url::parse(raw.trim()).map_err(|e| ConfigError::invalid(var, e))
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	const REQUIRED: [&str; 6] = [
		"TENANT_ID",
		"CLIENT_ID",
		"CLIENT_SECRET",
		"BING_NEWS_API_KEY",
		"SHARED_MAILBOX",
		"RECIPIENT_EMAIL",
	];

	fn complete() -> HashMap<&'static str, String> {
		HashMap::from([
			("TENANT_ID", "tenant".to_owned()),
			("CLIENT_ID", "client".to_owned()),
			("CLIENT_SECRET", "secret".to_owned()),
			("BING_NEWS_API_KEY", "key".to_owned()),
			("SHARED_MAILBOX", "news@example.com".to_owned()),
			("RECIPIENT_EMAIL", "a@example.com; b@example.com".to_owned()),
		])
	}

	fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
		Config::from_lookup(&|key: &str| vars.get(key).cloned())
	}

	#[test]
	fn defaults_fill_optional_values() {
		let config = load(&complete()).expect("Complete configuration should load.");

		assert_eq!(config.identity.flow, Flow::ClientCredentials);
		assert_eq!(config.identity.authority_host.as_str(), "https://login.microsoftonline.com/");
		assert_eq!(config.news.endpoint.as_str(), DEFAULT_NEWS_ENDPOINT);
		assert_eq!(config.news.keyword, DEFAULT_KEYWORD);
		assert_eq!(config.news.market, DEFAULT_MARKET);
		assert_eq!(config.mail.content_type, ContentType::Html);
		assert_eq!(config.mail.recipients.len(), 2);
		assert!(config.mail.save_to_sent_items);
		assert_eq!(config.http.timeout, StdDuration::from_secs(30));
	}

	#[test]
	fn each_missing_required_value_fails_fast() {
		for var in REQUIRED {
			let mut vars = complete();

			vars.remove(var);

			let err = load(&vars).expect_err("Missing values must be rejected.");

			assert!(
				matches!(err, ConfigError::Missing { var: missing } if missing == var),
				"unexpected error for {var}: {err:?}"
			);
		}
	}

	#[test]
	fn empty_values_count_as_missing() {
		let mut vars = complete();

		vars.insert("CLIENT_ID", "   ".to_owned());

		assert!(matches!(load(&vars), Err(ConfigError::Missing { var: "CLIENT_ID" })));
	}

	#[test]
	fn device_flow_does_not_need_a_secret() {
		let mut vars = complete();

		vars.remove("CLIENT_SECRET");
		vars.insert("AUTH_FLOW", "device_code".to_owned());

		let config = load(&vars).expect("Device-code configuration should load without a secret.");

		assert_eq!(config.identity.flow, Flow::DeviceCode);
		assert!(config.identity.client_secret.is_none());
		assert_eq!(config.identity.scopes, ScopeSet::user_read());
	}

	#[test]
	fn scopes_follow_flow_unless_configured() {
		let config = load(&complete()).expect("Complete configuration should load.");

		assert_eq!(config.identity.scopes, ScopeSet::graph_default());

		let mut vars = complete();

		vars.insert("AUTH_FLOW", "device_code".to_owned());
		vars.insert("AUTH_SCOPES", "User.Read Mail.Send.Shared".to_owned());

		let config = load(&vars).expect("Configured scopes should load.");

		assert_eq!(config.identity.scopes.len(), 2);
		assert!(config.identity.scopes.contains("Mail.Send.Shared"));
	}

	#[test]
	fn explicit_flow_overrides_environment() {
		let mut vars = complete();

		vars.insert("AUTH_FLOW", "client_credentials".to_owned());

		let config = Config::from_lookup_with_flow(&|key: &str| vars.get(key).cloned(), Some(Flow::DeviceCode))
			.expect("Configuration should load.");

		assert_eq!(config.identity.flow, Flow::DeviceCode);
	}

	#[test]
	fn malformed_values_are_invalid() {
		let mut vars = complete();

		vars.insert("HTTP_TIMEOUT_SECS", "soon".to_owned());

		assert!(matches!(load(&vars), Err(ConfigError::Invalid { var: "HTTP_TIMEOUT_SECS", .. })));

		let mut vars = complete();

		vars.insert("MAIL_CONTENT_TYPE", "markdown".to_owned());

		assert!(matches!(load(&vars), Err(ConfigError::Invalid { var: "MAIL_CONTENT_TYPE", .. })));

		let mut vars = complete();

		vars.insert("SHARED_MAILBOX", "not-an-address".to_owned());

		assert!(matches!(load(&vars), Err(ConfigError::Identifier(_))));
	}
}
