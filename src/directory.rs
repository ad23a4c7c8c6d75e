//! Read-only Microsoft Graph directory calls and the user-listing export.

// std
use std::{fs, path::Path};
// crates.io
use serde_json::{Serializer, Value, ser::PrettyFormatter};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{FetchError, TransportError},
	http,
	obs::{self, FlowKind},
};

const TARGET: &str = "the directory endpoint";

/// Graph client for `/me` and `/users`.
#[derive(Clone, Debug)]
pub struct DirectoryClient {
	http: ReqwestClient,
	graph_endpoint: Url,
}
impl DirectoryClient {
	/// Creates a client for the Graph base URL (e.g. `https://graph.microsoft.com/v1.0`).
	pub fn new(http: ReqwestClient, graph_endpoint: Url) -> Self {
		Self { http, graph_endpoint }
	}

	/// Profile of the signed-in user; needs a delegated token.
	pub async fn fetch_profile(&self, token: &AccessToken) -> Result<Value, FetchError> {
		self.get_json("me", token).await
	}

	/// Directory listing (`/users`); needs an application token with `User.Read.All`.
	pub async fn fetch_users(&self, token: &AccessToken) -> Result<Value, FetchError> {
		self.get_json("users", token).await
	}

	async fn get_json(&self, resource: &'static str, token: &AccessToken) -> Result<Value, FetchError> {
		obs::stage(FlowKind::Directory, resource, async move {
			let url =
				format!("{}/{resource}", self.graph_endpoint.as_str().trim_end_matches('/'));
			let response = self
				.http
				.get(url)
				.header(reqwest::header::AUTHORIZATION, token.bearer())
				.send()
				.await
				.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
			let body = http::success_body(TARGET, response).await?;

			http::decode_json(&body)
		})
		.await
	}
}

/// Serializes `document` with a four-space indent, keeping non-ASCII text as-is.
pub fn to_pretty_json(document: &Value) -> Result<Vec<u8>, serde_json::Error> {
	let mut out = Vec::new();
	let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));

	document.serialize(&mut serializer)?;

	Ok(out)
}

/// Writes `document` to `path` as pretty-printed JSON, replacing any existing file.
pub fn export_users(document: &Value, path: &Path) -> Result<()> {
	let bytes = to_pretty_json(document).map_err(|e| Error::Export {
		path: path.to_path_buf(),
		source: std::io::Error::other(e),
	})?;

	fs::write(path, bytes).map_err(|source| Error::Export { path: path.to_path_buf(), source })?;

	obs::event!(info, path = %path.display(), "Exported directory listing.");

	Ok(())
}
