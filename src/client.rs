//! The gated HTTP client: pre-flight token attachment and post-flight 401 recovery.

mod gate;
mod recovery;

// self
use crate::{
	_prelude::*,
	coordinator::{RefreshCoordinator, SessionObserver},
	obs::{self, Stage, StageOutcome, StageSpan},
	policy::ExpiryPolicy,
	store::CredentialStore,
	transport::{HttpRequest, HttpResponse, HttpTransport, RefreshTransport},
};
#[cfg(feature = "reqwest")]
use crate::transport::{ReqwestHttpTransport, ReqwestRefreshTransport};

#[cfg(feature = "reqwest")]
/// Gated client specialized for the crate's default reqwest transport.
pub type ReqwestGatedClient = GatedClient<ReqwestHttpTransport>;

/// HTTP client wrapper that keeps one credential set valid across arbitrarily many
/// concurrent requests.
///
/// Every business request passes through a pre-flight gate that attaches the bearer
/// token (refreshing it first when it is about to expire) and a post-flight recovery
/// hook that drives one refresh-and-retry cycle after an authorization failure. Both
/// hooks funnel into the same [`RefreshCoordinator`], so N concurrent requests never
/// produce more than one refresh call. Requests whose path falls under the auth prefix
/// bypass both hooks — the login and refresh calls themselves can never recurse into
/// the gate.
pub struct GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport executing every outbound request.
	pub transport: Arc<T>,
	/// Store owning the shared credential set.
	pub store: Arc<dyn CredentialStore>,
	/// Coordinator serializing refresh attempts for both hooks.
	pub coordinator: Arc<RefreshCoordinator>,
	/// Policy deciding when the stored token counts as expiring soon.
	pub policy: ExpiryPolicy,
	auth_prefix: String,
}
impl<T> GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Path prefix under which requests bypass the gate and recovery by default.
	pub const DEFAULT_AUTH_PREFIX: &'static str = "/auth/";

	/// Creates a client that reuses caller-provided transports.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		refresh: Arc<dyn RefreshTransport>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), refresh));

		Self::with_coordinator(store, coordinator, transport)
	}

	/// Creates a client around an existing coordinator, sharing its single-flight
	/// state with any other holder.
	pub fn with_coordinator(
		store: Arc<dyn CredentialStore>,
		coordinator: Arc<RefreshCoordinator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			coordinator,
			policy: ExpiryPolicy::default(),
			auth_prefix: Self::DEFAULT_AUTH_PREFIX.into(),
		}
	}

	/// Replaces the expiring-soon policy.
	pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Replaces the path prefix under which requests bypass the gate and recovery.
	pub fn with_auth_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.auth_prefix = prefix.into();

		self
	}

	/// Attaches an observer fired when a refresh fails unrecoverably.
	pub fn with_session_observer(self, observer: Arc<dyn SessionObserver>) -> Self {
		self.coordinator.set_session_observer(observer);

		self
	}

	/// Sends a request through the gate, transparently refreshing the token and
	/// retrying once when the server rejects it.
	///
	/// Requests under the auth prefix are forwarded verbatim. All other failures reach
	/// the caller after at most one recovery attempt; a transport error is never
	/// retried here.
	pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
		const STAGE: Stage = Stage::Request;

		let span = StageSpan::new(STAGE, "execute");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				if self.bypasses_gate(&request) {
					return Ok(self.transport.execute(request).await?);
				}

				let request = self.gate_request(request).await?;
				let retry_template = clone_request(&request);
				let response = self.transport.execute(request).await?;

				self.recover_unauthorized(response, retry_template).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	/// Signs the user out by discarding the stored credential set.
	pub async fn sign_out(&self) -> Result<()> {
		Ok(self.store.clear().await?)
	}

	fn bypasses_gate(&self, request: &HttpRequest) -> bool {
		request.uri().path().starts_with(&self.auth_prefix)
	}
}
impl<T> Clone for GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			coordinator: self.coordinator.clone(),
			policy: self.policy,
			auth_prefix: self.auth_prefix.clone(),
		}
	}
}
impl<T> Debug for GatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatedClient")
			.field("policy", &self.policy)
			.field("auth_prefix", &self.auth_prefix)
			.finish()
	}
}
#[cfg(feature = "reqwest")]
impl GatedClient<ReqwestHttpTransport> {
	/// Creates a client that provisions its own reqwest transport pair, sharing one
	/// connection pool between business requests and the refresh endpoint.
	pub fn new(store: Arc<dyn CredentialStore>, refresh_endpoint: Url) -> Self {
		let client = ReqwestClient::default();

		Self::with_transport(
			store,
			Arc::new(ReqwestRefreshTransport::with_client(client.clone(), refresh_endpoint)),
			ReqwestHttpTransport::with_client(client),
		)
	}
}

/// Clones a buffered request so the recovery path can re-issue it once.
pub(crate) fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut copy = HttpRequest::new(request.body().clone());

	*copy.method_mut() = request.method().clone();
	*copy.uri_mut() = request.uri().clone();
	*copy.version_mut() = request.version();
	*copy.headers_mut() = request.headers().clone();

	copy
}
