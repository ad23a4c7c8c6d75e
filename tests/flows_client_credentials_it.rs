// crates.io
use httpmock::prelude::*;
// self
use news_relay::{
	_preludet::*,
	auth::ScopeSet,
	error::{AuthError, ConfigError},
	flows::Flow,
};

const TOKEN_PATH: &str = "/tenant-test/oauth2/v2.0/token";

#[tokio::test]
async fn client_credentials_exchanges_secret_for_app_token() {
	let server = MockServer::start_async().await;
	let identity = test_identity_config(&server.url(""), Flow::ClientCredentials);
	let provider = build_test_provider(&identity);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.body_includes("grant_type=client_credentials")
				.body_includes("client_id=client-test")
				.body_includes("client_secret=secret-test")
				.body_includes("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"app-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let token = provider
		.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
		.await
		.expect("Client credentials exchange should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.secret.expose(), "app-token");
	assert_eq!(token.bearer(), "Bearer app-token");
	assert!(token.scope.contains("https://graph.microsoft.com/.default"));
	assert!(token.expires_at.is_some());
}

#[tokio::test]
async fn every_call_performs_a_fresh_exchange() {
	let server = MockServer::start_async().await;
	let identity = test_identity_config(&server.url(""), Flow::ClientCredentials);
	let provider = build_test_provider(&identity);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"app-token\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let scopes = ScopeSet::graph_default();

	for _ in 0..2 {
		let token = provider
			.acquire_token(Flow::ClientCredentials, &scopes)
			.await
			.expect("Client credentials exchange should succeed.");

		assert!(token.expires_at.is_none());
	}

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn provider_error_is_carried_verbatim() {
	let server = MockServer::start_async().await;
	let identity = test_identity_config(&server.url(""), Flow::ClientCredentials);
	let provider = build_test_provider(&identity);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"AADSTS7000215: Invalid client secret provided.\"}",
			);
		})
		.await;
	let err = provider
		.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
		.await
		.expect_err("Rejected exchange should fail.");

	mock.assert_calls_async(1).await;

	match err {
		Error::Auth(AuthError::Rejected { error, description, status }) => {
			assert_eq!(error, "invalid_client");
			assert_eq!(description.as_deref(), Some("AADSTS7000215: Invalid client secret provided."));
			assert_eq!(status, Some(401));
		},
		other => panic!("Expected a rejected token exchange, got {other:?}."),
	}
}

#[tokio::test]
async fn success_status_without_access_token_is_rejected() {
	let server = MockServer::start_async().await;
	let identity = test_identity_config(&server.url(""), Flow::ClientCredentials);
	let provider = build_test_provider(&identity);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_scope\",\"error_description\":\"AADSTS70011\"}");
		})
		.await;
	let err = provider
		.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
		.await
		.expect_err("A body without an access token should fail.");

	assert!(matches!(
		&err,
		Error::Auth(AuthError::Rejected { error, .. }) if error == "invalid_scope"
	));
	assert!(err.to_string().contains("AADSTS70011"));
}

#[tokio::test]
async fn unparseable_token_body_reports_missing_access_token() {
	let server = MockServer::start_async().await;
	let identity = test_identity_config(&server.url(""), Flow::ClientCredentials);
	let provider = build_test_provider(&identity);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body("{\"token_type\":\"Bearer\"}");
		})
		.await;
	let err = provider
		.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
		.await
		.expect_err("A body without an access token should fail.");

	assert!(matches!(err, Error::Auth(AuthError::MissingAccessToken { status: Some(200), .. })));
}

#[tokio::test]
async fn client_credentials_without_secret_fails_before_any_request() {
	let server = MockServer::start_async().await;
	let mut identity = test_identity_config(&server.url(""), Flow::DeviceCode);

	identity.client_secret = None;

	let provider = build_test_provider(&identity);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let err = provider
		.acquire_token(Flow::ClientCredentials, &ScopeSet::graph_default())
		.await
		.expect_err("A missing secret should fail.");

	mock.assert_calls_async(0).await;

	assert!(matches!(err, Error::Config(ConfigError::Missing { var: "CLIENT_SECRET" })));
}
