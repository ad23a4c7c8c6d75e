//! Internal OAuth client facade abstractions.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, DeviceAuthorizationResponse, DeviceAuthorizationUrl,
	EndpointNotSet, EndpointSet, ErrorResponseType, ExtraDeviceAuthorizationFields,
	HttpClientError, RequestTokenError, Scope, StandardErrorResponse, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	error::{AuthError, ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

const TOKEN_ENDPOINT: &str = "the token endpoint";

/// Device-authorization response as returned by the Microsoft identity platform.
pub type DeviceAuthorization = DeviceAuthorizationResponse<DeviceAuthorizationExtras>;

/// Provider-specific fields of a device-authorization response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceAuthorizationExtras {
	/// Ready-to-display instructions (`"To sign in, use a web browser to open ..."`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
impl ExtraDeviceAuthorizationFields for DeviceAuthorizationExtras {}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => AuthError::Transport(TransportError::Io(inner)).into(),
			HttpClientError::Other(message) => AuthError::UnexpectedResponse {
				message: format!("HTTP client error during the {grant} grant: {message}"),
				status: meta_status(meta),
			}
			.into(),
			_ => AuthError::UnexpectedResponse {
				message: format!("HTTP client error during the {grant} grant"),
				status: meta_status(meta),
			}
			.into(),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_client_credentials<'a, 'scope>(
		&'a self,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, AccessToken>
	where
		'scope: 'a;

	fn start_device_authorization<'a, 'scope>(
		&'a self,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, DeviceAuthorization>
	where
		'scope: 'a;

	fn poll_device_token<'a, 'details, 'scope>(
		&'a self,
		details: &'details DeviceAuthorization,
		requested_scope: &'scope ScopeSet,
		timeout: Option<std::time::Duration>,
	) -> FacadeFuture<'a, AccessToken>
	where
		'details: 'a,
		'scope: 'a;
}

pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptorUrl { source })?;
		let device_url =
			DeviceAuthorizationUrl::new(descriptor.endpoints.device_authorization.to_string())
				.map_err(|source| ConfigError::InvalidDescriptorUrl { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_token_uri(token_url)
			.set_device_authorization_url(device_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_client_credentials<'a, 'scope>(
		&'a self,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, AccessToken>
	where
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_client_credentials();

			for scope in requested_scope.iter() {
				request = request.add_scope(Scope::new(scope.to_owned()));
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					GrantType::ClientCredentials,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			Ok(map_token_response(requested_scope, &response))
		})
	}

	fn start_device_authorization<'a, 'scope>(
		&'a self,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, DeviceAuthorization>
	where
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_device_code();

			for scope in requested_scope.iter() {
				request = request.add_scope(Scope::new(scope.to_owned()));
			}

			let details: DeviceAuthorization =
				request.request_async(&instrumented).await.map_err(|err| {
					map_initiation_error(meta.take(), err, self.error_mapper.as_ref())
				})?;

			if details.user_code().secret().is_empty() {
				return Err(AuthError::FlowInitiation {
					reason: "the provider returned an empty user code".into(),
				}
				.into());
			}

			Ok(details)
		})
	}

	fn poll_device_token<'a, 'details, 'scope>(
		&'a self,
		details: &'details DeviceAuthorization,
		requested_scope: &'scope ScopeSet,
		timeout: Option<std::time::Duration>,
	) -> FacadeFuture<'a, AccessToken>
	where
		'details: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response: BasicTokenResponse = self
				.oauth_client
				.exchange_device_access_token(details)
				.request_async(&instrumented, tokio::time::sleep, timeout)
				.await
				.map_err(|err| {
					map_request_error(
						GrantType::DeviceCode,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;

			Ok(map_token_response(requested_scope, &response))
		})
	}
}

/// Error body shape shared by OAuth providers (`error`, `error_description`).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

fn map_token_response(requested_scope: &ScopeSet, response: &BasicTokenResponse) -> AccessToken {
	let expires_in = response
		.expires_in()
		.and_then(|ttl| i64::try_from(ttl.as_secs()).ok())
		.filter(|secs| *secs > 0)
		.map(Duration::seconds);
	// Providers may widen delegated scopes (`openid profile`); report what was granted.
	let scope = response
		.scopes()
		.and_then(|granted| {
			ScopeSet::new(granted.iter().map(|scope| scope.as_str().to_owned())).ok()
		})
		.filter(|granted| !granted.is_empty())
		.unwrap_or_else(|| requested_scope.clone());

	AccessToken::issued_now(response.access_token().secret().to_owned(), scope, expires_in)
}

fn map_request_error<E, T, M>(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, StandardErrorResponse<T>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	T: ErrorResponseType + AsRef<str> + Display,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => AuthError::Rejected {
			error: response.error().as_ref().to_owned(),
			description: response.error_description().cloned(),
			status: meta_status(meta_ref),
		}
		.into(),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta_ref, error),
		RequestTokenError::Parse(source, body) => match parse_error_body(&body) {
			Some(body) => AuthError::Rejected {
				error: body.error,
				description: body.error_description,
				status: meta_status(meta_ref),
			}
			.into(),
			None => AuthError::MissingAccessToken { source, status: meta_status(meta_ref) }.into(),
		},
		RequestTokenError::Other(message) =>
			AuthError::UnexpectedResponse { message, status: meta_status(meta_ref) }.into(),
	}
}

fn map_initiation_error<E, T, M>(
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, StandardErrorResponse<T>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	T: ErrorResponseType + AsRef<str> + Display,
	M: ?Sized + TransportErrorMapper<E>,
{
	let reason = match err {
		RequestTokenError::ServerResponse(response) => match response.error_description() {
			Some(description) => format!("{}: {description}", response.error().as_ref()),
			None => response.error().as_ref().to_owned(),
		},
		RequestTokenError::Request(error) =>
			return mapper.map_transport_error(GrantType::DeviceCode, meta.as_ref(), error),
		RequestTokenError::Parse(source, body) => match parse_error_body(&body) {
			Some(body) => match body.error_description {
				Some(description) => format!("{}: {description}", body.error),
				None => body.error,
			},
			None => format!("the response did not contain a user code ({source})"),
		},
		RequestTokenError::Other(message) => message,
	};

	AuthError::FlowInitiation { reason }.into()
}

fn parse_error_body(body: &[u8]) -> Option<OAuthErrorBody> {
	serde_json::from_slice::<OAuthErrorBody>(body).ok()
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	AuthError::Transport(TransportError::from_reqwest(TOKEN_ENDPOINT, err)).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
