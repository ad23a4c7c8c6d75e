//! Relay the latest news item for a keyword from a shared mailbox through Microsoft Graph.
//!
//! The crate obtains a bearer token with the OAuth 2.0 client-credential or device-code flow,
//! fetches one item from the news-search API, renders it, and sends it with the Graph
//! `sendMail` endpoint. [`pipeline::Pipeline`] sequences the stages and reports a single
//! [`pipeline::Outcome`] per run.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod flows;
pub mod http;
pub mod mail;
pub mod news;
pub mod oauth;
pub mod obs;
pub mod pipeline;
pub mod present;
pub mod provider;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{Config, HttpConfig, IdentityConfig, MailConfig, NewsConfig},
		flows::{CredentialProvider, Flow},
		http::ReqwestHttpClient,
		present::ContentType,
	};

	/// Builds a reqwest client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Wraps [`test_reqwest_client`] for token exchanges.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_client(test_reqwest_client())
	}

	/// Identity configuration pointing the authority at a mock server base URL.
	pub fn test_identity_config(authority_host: &str, flow: Flow) -> IdentityConfig {
		let lookup = |key: &str| match key {
			"TENANT_ID" => Some("tenant-test".to_owned()),
			"CLIENT_ID" => Some("client-test".to_owned()),
			"CLIENT_SECRET" => Some("secret-test".to_owned()),
			"AUTHORITY_HOST" => Some(authority_host.to_owned()),
			_ => None,
		};

		IdentityConfig::from_lookup(&lookup, flow)
			.expect("Test identity configuration should be valid.")
	}

	/// Full pipeline configuration with every endpoint served by one mock server.
	pub fn test_config(base: &str, flow: Flow, content_type: ContentType) -> Config {
		let identity = test_identity_config(base, flow);
		let news_endpoint = format!("{}/bing/", base.trim_end_matches('/'));
		let graph_endpoint = format!("{}/v1.0", base.trim_end_matches('/'));
		let lookup = |key: &str| match key {
			"BING_NEWS_API_KEY" => Some("news-key-test".to_owned()),
			"BING_NEWS_ENDPOINT" => Some(news_endpoint.clone()),
			"KEYWORD" => Some("AI".to_owned()),
			"NEWS_MARKET" => Some("en-US".to_owned()),
			"SHARED_MAILBOX" => Some("news@example.com".to_owned()),
			"RECIPIENT_EMAIL" => Some("reader@example.com".to_owned()),
			"GRAPH_ENDPOINT" => Some(graph_endpoint.clone()),
			_ => None,
		};
		let news =
			NewsConfig::from_lookup(&lookup).expect("Test news configuration should be valid.");
		let mut mail =
			MailConfig::from_lookup(&lookup).expect("Test mail configuration should be valid.");

		mail.content_type = content_type;

		Config { identity, news, mail, http: HttpConfig::default() }
	}

	/// Credential provider wired to the insecure test transport.
	pub fn build_test_provider(identity: &IdentityConfig) -> CredentialProvider {
		CredentialProvider::from_config(identity, test_reqwest_http_client())
			.expect("Test credential provider should build.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Used by the `news-relay` binary only.
use {clap as _, color_eyre as _, dotenvy as _, tracing_subscriber as _};
#[cfg(test)] use httpmock as _;
