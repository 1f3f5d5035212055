//! Credential-set data model: redacting token secrets and the stored record.

// self
use crate::{_prelude::*, transport::TokenResponse};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Credential set shared by every gated request.
///
/// The set is owned by a [`CredentialStore`](crate::store::CredentialStore) and only
/// ever replaced or cleared as a whole — no component keeps a private copy across
/// calls, and no store exposes a partially updated set.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
	/// Bearer access token attached to outbound requests.
	pub access_token: TokenSecret,
	/// Refresh token presented to the refresh endpoint; never attached to requests.
	pub refresh_token: TokenSecret,
	/// Absolute expiry of the access token; `None` when the issuer did not report one.
	pub expires_at: Option<OffsetDateTime>,
}
impl Credentials {
	/// Builds a credential set from a token-endpoint response, deriving the absolute
	/// expiry from the relative `expires_in` the endpoint reports.
	pub fn from_token_response(response: &TokenResponse, now: OffsetDateTime) -> Self {
		Self {
			access_token: TokenSecret::new(response.access_token.clone()),
			refresh_token: TokenSecret::new(response.refresh_token.clone()),
			expires_at: Some(now + Duration::seconds(response.expires_in)),
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
