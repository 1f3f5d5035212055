//! Transport seams: generic request execution and the refresh network call.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack for business
//! requests, and [`RefreshTransport`] isolates the single network call the
//! coordinator may have in flight. Both hand out boxed `Send` futures so the gate and
//! the coordinator stay object-safe and runtime-agnostic. The default `reqwest`
//! implementations buffer whole responses; the gate relies on that to re-issue a
//! request once after an authorization failure.

// std
use std::ops::Deref;
// crates.io
use http::{Request, Response};
// self
use crate::{_prelude::*, error::TransportError};

/// Outbound request type accepted by [`HttpTransport`].
pub type HttpRequest = Request<Vec<u8>>;
/// Buffered response type returned by [`HttpTransport`].
pub type HttpResponse = Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;
/// Boxed future returned by [`RefreshTransport::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenResponse, RefreshError>> + 'a + Send>>;

/// Abstraction over HTTP transports that execute gated business requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared
/// across every in-flight request without additional wrappers.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes a single request, returning the fully buffered response.
	///
	/// A response with a non-success status is `Ok`; only failures to reach the server
	/// surface as [`TransportError`].
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Performs the refresh network call against the backend's refresh endpoint.
///
/// The coordinator treats this as a black box: any error is a refresh failure and is
/// never retried, because most refresh tokens are single-use or revoked on failure.
pub trait RefreshTransport
where
	Self: Send + Sync,
{
	/// Exchanges `refresh_token` for a fresh token set.
	fn refresh(&self, refresh_token: &str) -> RefreshFuture<'_>;
}

/// Token payload returned by the refresh (and login) endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Newly issued access token.
	pub access_token: String,
	/// Refresh token to present next time; issuers may return the same one.
	pub refresh_token: String,
	/// Token scheme reported by the endpoint, `bearer` in practice.
	pub token_type: String,
	/// Seconds until the access token expires.
	pub expires_in: i64,
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Failures surfaced by [`RefreshTransport`] implementations.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Transport failure before a usable response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Refresh endpoint rejected the call (invalid or revoked refresh token).
	#[error("Refresh endpoint rejected the call with status {status}.")]
	Rejected {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// Refresh endpoint responded with malformed JSON.
	#[error("Refresh endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

#[cfg(feature = "reqwest")]
#[derive(Serialize)]
struct RefreshRequest {
	refresh_token: String,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(TransportError::from)?;
			let response = client.execute(request).await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut buffered =
				HttpResponse::new(response.bytes().await.map_err(TransportError::from)?.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}

/// Reqwest-backed [`RefreshTransport`] posting the refresh token as JSON.
///
/// Mirrors the backend contract: `POST <endpoint> {"refresh_token"}` answered with a
/// [`TokenResponse`] body on success; any non-success status is a refresh failure.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestRefreshTransport {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestRefreshTransport {
	/// Creates a transport targeting `endpoint` with a default client.
	pub fn new(endpoint: Url) -> Self {
		Self::with_client(ReqwestClient::default(), endpoint)
	}

	/// Creates a transport reusing a caller-provided client.
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint }
	}

	/// Returns the refresh endpoint this transport targets.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
#[cfg(feature = "reqwest")]
impl RefreshTransport for ReqwestRefreshTransport {
	fn refresh(&self, refresh_token: &str) -> RefreshFuture<'_> {
		let client = self.client.clone();
		let endpoint = self.endpoint.clone();
		let body = RefreshRequest { refresh_token: refresh_token.into() };

		Box::pin(async move {
			let response = client
				.post(endpoint)
				.json(&body)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let bytes = response.bytes().await.map_err(TransportError::from)?;

			if !status.is_success() {
				return Err(RefreshError::Rejected { status: status.as_u16() });
			}

			let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

			serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
				RefreshError::MalformedResponse { source, status: Some(status.as_u16()) }
			})
		})
	}
}
