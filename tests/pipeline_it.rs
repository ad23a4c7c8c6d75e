// crates.io
use httpmock::prelude::*;
// self
use news_relay::{
	_preludet::*,
	config::Config,
	error::{ConfigError, FetchError, SendError},
	flows::{DeviceCodePrompt, DevicePrompt, Flow},
	pipeline::{Outcome, Pipeline, PipelineState},
	present::ContentType,
};

const DEVICE_PATH: &str = "/tenant-test/oauth2/v2.0/devicecode";
const TOKEN_PATH: &str = "/tenant-test/oauth2/v2.0/token";
const SEARCH_PATH: &str = "/bing/v7.0/news/search";
const SEND_PATH: &str = "/v1.0/users/news@example.com/sendMail";
const ONE_RESULT: &str = "{\"value\":[{\"name\":\"AI breakthrough\",\"url\":\"https://example.com/a\",\"provider\":[{\"name\":\"Example Wire\"}],\"datePublished\":\"2024-05-01T03:00:00Z\"}]}";

#[derive(Clone, Default)]
struct CountingPrompt(Arc<Mutex<Vec<String>>>);
impl DevicePrompt for CountingPrompt {
	fn present(&self, prompt: &DeviceCodePrompt) {
		self.0.lock().push(prompt.user_code.clone());
	}
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"app-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await
}

async fn mock_search<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
	let body = body.to_owned();

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(SEARCH_PATH)
				.header("Ocp-Apim-Subscription-Key", "news-key-test")
				.query_param("q", "AI")
				.query_param("count", "1")
				.query_param("mkt", "en-US")
				.query_param("sortBy", "Date");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

fn pipeline(server: &MockServer, content_type: ContentType) -> Pipeline {
	let config = test_config(&server.url(""), Flow::ClientCredentials, content_type);

	Pipeline::from_config(config, test_reqwest_client()).expect("Pipeline should build.")
}

#[tokio::test]
async fn run_sends_top_item_from_shared_mailbox() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server).await;
	let search_mock = mock_search(&server, ONE_RESULT).await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(SEND_PATH)
				.header("authorization", "Bearer app-token")
				.body_includes("\"subject\":\"[Bing News] AI breakthrough\"")
				.body_includes("\"contentType\":\"HTML\"")
				.body_includes("2024/05/01")
				.body_includes("\"toRecipients\":[{\"emailAddress\":{\"address\":\"reader@example.com\"}}]")
				.body_includes("\"saveToSentItems\":true");
			then.status(202);
		})
		.await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	token_mock.assert_calls_async(2).await;
	search_mock.assert_calls_async(1).await;
	send_mock.assert_calls_async(1).await;

	assert_eq!(outcome.state(), PipelineState::Sent);

	match outcome {
		Outcome::Sent { subject } => assert_eq!(subject, "[Bing News] AI breakthrough"),
		other => panic!("Expected a sent outcome, got {other:?}."),
	}
}

#[tokio::test]
async fn text_content_type_sends_plain_body() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server).await;
	let _search_mock = mock_search(&server, ONE_RESULT).await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(SEND_PATH)
				.body_includes("\"contentType\":\"Text\"")
				.body_includes("URL: https://example.com/a");
			then.status(202);
		})
		.await;
	let outcome = pipeline(&server, ContentType::Text).run().await;

	send_mock.assert_calls_async(1).await;

	assert!(matches!(outcome, Outcome::Sent { .. }));
}

#[tokio::test]
async fn rejected_send_fails_with_status_and_body() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server).await;
	let _search_mock = mock_search(&server, ONE_RESULT).await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH);
			then.status(400).body("bad request");
		})
		.await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	send_mock.assert_calls_async(1).await;

	assert_eq!(outcome.state(), PipelineState::Failed);
	assert!(!outcome.is_success());

	match outcome {
		Outcome::Failed { at, error } => {
			assert_eq!(at, PipelineState::Rendered);
			assert!(matches!(error, Error::Send(SendError::Rejected { status: 400, .. })));

			let message = error.to_string();

			assert!(message.contains("400"));
			assert!(message.contains("bad request"));
		},
		other => panic!("Expected a failed outcome, got {other:?}."),
	}
}

#[tokio::test]
async fn non_accepted_success_status_still_fails() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server).await;
	let _search_mock = mock_search(&server, ONE_RESULT).await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH);
			then.status(200).body("ok");
		})
		.await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	send_mock.assert_calls_async(1).await;

	match outcome {
		Outcome::Failed { at, error } => {
			assert_eq!(at, PipelineState::Rendered);
			assert!(matches!(error, Error::Send(SendError::Rejected { status: 200, .. })));
			assert!(error.to_string().contains("HTTP 200: ok"));
		},
		other => panic!("Expected a failed outcome, got {other:?}."),
	}
}

#[tokio::test]
async fn device_code_flow_signs_in_before_each_token() {
	let server = MockServer::start_async().await;
	let device_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(DEVICE_PATH)
				.body_includes("client_id=client-test")
				.body_includes("scope=User.Read");
			then.status(200).header("content-type", "application/json").body(
				"{\"device_code\":\"dev-123\",\"user_code\":\"ABCD-1234\",\"verification_uri\":\"https://microsoft.com/devicelogin\",\"expires_in\":900,\"interval\":1}",
			);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).body_includes("device_code=dev-123");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"user-token\",\"token_type\":\"Bearer\",\"expires_in\":3599,\"scope\":\"User.Read\"}",
			);
		})
		.await;
	let _search_mock = mock_search(&server, ONE_RESULT).await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH).header("authorization", "Bearer user-token");
			then.status(202);
		})
		.await;
	let prompts = CountingPrompt::default();
	let config = test_config(&server.url(""), Flow::DeviceCode, ContentType::Html);
	let outcome = Pipeline::from_config(config, test_reqwest_client())
		.expect("Pipeline should build.")
		.with_prompt(prompts.clone())
		.run()
		.await;

	device_mock.assert_calls_async(2).await;
	token_mock.assert_calls_async(2).await;
	send_mock.assert_calls_async(1).await;

	match outcome {
		Outcome::Sent { subject } => assert_eq!(subject, "[Bing News] AI breakthrough"),
		other => panic!("Expected a sent outcome, got {other:?}."),
	}

	assert_eq!(*prompts.0.lock(), ["ABCD-1234", "ABCD-1234"]);
}

#[tokio::test]
async fn empty_search_ends_in_no_item_without_sending() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server).await;
	let search_mock = mock_search(&server, "{\"value\":[]}").await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH);
			then.status(202);
		})
		.await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	token_mock.assert_calls_async(1).await;
	search_mock.assert_calls_async(1).await;
	send_mock.assert_calls_async(0).await;

	assert!(matches!(outcome, Outcome::NoItem));
	assert!(outcome.is_success());
}

#[tokio::test]
async fn search_failure_carries_status_and_body() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server).await;
	let _search_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(SEARCH_PATH);
			then.status(401).body("{\"error\":{\"code\":\"401\",\"message\":\"Access denied.\"}}");
		})
		.await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH);
			then.status(202);
		})
		.await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	send_mock.assert_calls_async(0).await;

	match outcome {
		Outcome::Failed { at, error: Error::Fetch(FetchError::Status { status, body }) } => {
			assert_eq!(at, PipelineState::TokenAcquired);
			assert_eq!(status, 401);
			assert!(body.contains("Access denied."));
		},
		other => panic!("Expected a fetch failure, got {other:?}."),
	}
}

#[tokio::test]
async fn token_failure_stops_before_search() {
	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"unauthorized_client\",\"error_description\":\"AADSTS700016: Application not found.\"}",
			);
		})
		.await;
	let search_mock = mock_search(&server, ONE_RESULT).await;
	let outcome = pipeline(&server, ContentType::Html).run().await;

	search_mock.assert_calls_async(0).await;

	match outcome {
		Outcome::Failed { at, error: Error::Auth(auth) } => {
			assert_eq!(at, PipelineState::Idle);
			assert_eq!(auth.provider_error(), Some("unauthorized_client"));
		},
		other => panic!("Expected an auth failure, got {other:?}."),
	}
}

#[tokio::test]
async fn missing_configuration_fails_before_any_request() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server).await;
	let base = server.url("");
	let lookup = |key: &str| match key {
		"TENANT_ID" => Some("tenant-test".to_owned()),
		"CLIENT_ID" => Some("client-test".to_owned()),
		"CLIENT_SECRET" => Some("secret-test".to_owned()),
		"AUTHORITY_HOST" => Some(base.clone()),
		"SHARED_MAILBOX" => Some("news@example.com".to_owned()),
		"RECIPIENT_EMAIL" => Some("reader@example.com".to_owned()),
		_ => None,
	};
	let err = Config::from_lookup(&lookup).expect_err("A missing API key must be rejected.");

	token_mock.assert_calls_async(0).await;

	assert!(matches!(err, ConfigError::Missing { var: "BING_NEWS_API_KEY" }));
}
