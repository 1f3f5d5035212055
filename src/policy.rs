//! Pure expiring-soon decisions for stored access tokens.

// self
use crate::_prelude::*;

/// Decides whether a stored access token is close enough to expiry that a proactive
/// refresh should run before the next request goes out.
///
/// The decision is a pure function of the clock and the stored expiry; the policy holds
/// no mutable state and can be evaluated freely while a refresh is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryPolicy {
	window: Duration,
}
impl ExpiryPolicy {
	/// Default lead time: long enough to finish a refresh round-trip before the token is
	/// actually rejected upstream.
	pub const DEFAULT_WINDOW: Duration = Duration::minutes(5);

	/// Creates a policy with the provided lead window; negative windows clamp to zero.
	pub fn new(window: Duration) -> Self {
		Self { window: if window.is_negative() { Duration::ZERO } else { window } }
	}

	/// Returns the configured lead window.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Returns `true` when the token must be refreshed before use.
	///
	/// A missing expiry is treated as already expired: the issuer gave no grounds to
	/// trust the token, so the next request forces a refresh.
	pub fn is_expiring_soon(
		&self,
		now: OffsetDateTime,
		expires_at: Option<OffsetDateTime>,
	) -> bool {
		match expires_at {
			Some(expires_at) => expires_at - now < self.window,
			None => true,
		}
	}
}
impl Default for ExpiryPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_WINDOW)
	}
}
