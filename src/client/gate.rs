//! Pre-flight request gate: bearer attachment and proactive refresh.

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	client::GatedClient,
	credential::TokenSecret,
	error::ConfigError,
	transport::{HttpRequest, HttpTransport},
};

impl<T> GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Attaches a valid bearer token to `request`, suspending on a proactive refresh
	/// when the stored token is about to expire.
	///
	/// Without stored credentials the request leaves unauthenticated: the server gets
	/// to reject it, and nothing here blocks waiting for a login. When a refresh
	/// resolves with no token the request likewise leaves unauthenticated.
	pub(crate) async fn gate_request(&self, mut request: HttpRequest) -> Result<HttpRequest> {
		let token = match self.store.load().await? {
			Some(credentials)
				if !self
					.policy
					.is_expiring_soon(OffsetDateTime::now_utc(), credentials.expires_at) =>
				Some(credentials.access_token),
			Some(_) => self.coordinator.refresh().await,
			None => None,
		};

		if let Some(token) = &token {
			request.headers_mut().insert(AUTHORIZATION, bearer_header(token)?);
		}

		Ok(request)
	}
}

/// Encodes `token` as an `Authorization: Bearer …` header value, marked sensitive so
/// transport-level logging never prints it.
pub(crate) fn bearer_header(token: &TokenSecret) -> Result<HeaderValue> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
		.map_err(ConfigError::from)?;

	value.set_sensitive(true);

	Ok(value)
}
