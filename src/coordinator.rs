//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator`] serializes every refresh attempt — proactive (expiring-soon)
//! or reactive (after a 401) — into at most one network call against the refresh
//! endpoint. Callers that arrive while a refresh is in flight join a waiter queue and
//! observe that refresh's outcome; none of them issues a second call. A successful
//! refresh replaces the stored credential set before any waiter is released; a failed
//! refresh clears the set, releases every waiter empty-handed, and fires the
//! session-terminated signal exactly once — never once per queued caller. Dropping the
//! leading call mid-refresh releases the queue and returns the state to idle; it never
//! wedges the coordinator or the callers queued behind it.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	credential::{Credentials, TokenSecret},
	obs::{self, Stage, StageOutcome, StageSpan},
	store::CredentialStore,
	transport::RefreshTransport,
};

/// Observer notified when the session can no longer be recovered and the user must
/// authenticate again — the application-side analogue of a redirect to the login page.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Invoked at most once per failed refresh.
	fn on_session_terminated(&self);
}

/// Fallback observer that ignores the signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionObserver;
impl SessionObserver for NoopSessionObserver {
	fn on_session_terminated(&self) {}
}

enum RefreshState {
	Idle,
	Refreshing { waiters: Vec<oneshot::Sender<Option<TokenSecret>>> },
}

/// Settles the in-flight refresh when the leading call ends, however it ends.
///
/// Restores `Idle` and resolves every queued waiter with the recorded outcome on drop.
/// The leading future can be dropped mid-refresh (a caller-side timeout or task abort),
/// and without this guard the state would stay `Refreshing` forever with the queued
/// waiters pending. A cancelled leader settles its waiters with `None`; the next
/// `refresh` call leads a fresh attempt against the untouched credential set.
struct RefreshSettler<'a> {
	coordinator: &'a RefreshCoordinator,
	outcome: Option<TokenSecret>,
}
impl Drop for RefreshSettler<'_> {
	fn drop(&mut self) {
		let waiters = {
			let mut state = self.coordinator.state.lock();

			match mem::replace(&mut *state, RefreshState::Idle) {
				RefreshState::Refreshing { waiters } => waiters,
				RefreshState::Idle => Vec::new(),
			}
		};

		for waiter in waiters {
			let _ = waiter.send(self.outcome.clone());
		}
	}
}

/// Serializes refresh attempts into at most one in-flight network call and fans the
/// settled outcome out to every caller that asked while it was running.
pub struct RefreshCoordinator {
	/// Shared counters covering every refresh attempt handled by this coordinator.
	pub refresh_metrics: Arc<RefreshMetrics>,
	store: Arc<dyn CredentialStore>,
	transport: Arc<dyn RefreshTransport>,
	observer: RwLock<Arc<dyn SessionObserver>>,
	state: Mutex<RefreshState>,
}
impl RefreshCoordinator {
	/// Creates a coordinator over the provided store and refresh transport.
	pub fn new(store: Arc<dyn CredentialStore>, transport: Arc<dyn RefreshTransport>) -> Self {
		Self {
			refresh_metrics: Default::default(),
			store,
			transport,
			observer: RwLock::new(Arc::new(NoopSessionObserver)),
			state: Mutex::new(RefreshState::Idle),
		}
	}

	/// Replaces the observer notified on unrecoverable refresh failures.
	pub fn set_session_observer(&self, observer: Arc<dyn SessionObserver>) {
		*self.observer.write() = observer;
	}

	/// Requests a valid access token, refreshing the stored credential set when needed.
	///
	/// Resolves to `None` when the session cannot be recovered; by then the credential
	/// set has been cleared and the session observer notified. The coordinator never
	/// surfaces an error past this boundary.
	pub async fn refresh(&self) -> Option<TokenSecret> {
		const STAGE: Stage = Stage::Refresh;

		let span = StageSpan::new(STAGE, "refresh");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.refresh_serialized()).await;

		match &result {
			Some(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			None => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn refresh_serialized(&self) -> Option<TokenSecret> {
		// The state guard must not live across an await: holding it would wedge every
		// other caller and make the returned future `!Send`.
		let receiver = {
			let mut state = self.state.lock();

			match &mut *state {
				RefreshState::Refreshing { waiters } => {
					let (sender, receiver) = oneshot::channel();

					waiters.push(sender);

					Some(receiver)
				},
				RefreshState::Idle => {
					*state = RefreshState::Refreshing { waiters: Vec::new() };

					None
				},
			}
		};

		if let Some(receiver) = receiver {
			self.refresh_metrics.record_join();

			// The leader settles the queue when it finishes or is dropped, so the
			// sender cannot be left unresolved.
			return receiver.await.unwrap_or(None);
		}

		let mut settler = RefreshSettler { coordinator: self, outcome: None };

		settler.outcome = self.lead_refresh().await;

		settler.outcome.clone()
	}

	/// Performs the single network refresh. Runs at most once at a time; only the
	/// caller that transitioned the state to `Refreshing` ever gets here.
	async fn lead_refresh(&self) -> Option<TokenSecret> {
		let current = match self.store.load().await {
			Ok(current) => current,
			Err(e) => {
				obs::warn_stage(Stage::Refresh, "Credential load failed during refresh.", &e);

				return self.terminate_session().await;
			},
		};
		// Nothing to refresh with: the set was already cleared by a failed refresh or an
		// explicit sign-out, and the signal fired back then. Resolving quietly avoids a
		// redirect per straggler request.
		let current = current?;
		let previous_expiry = current.expires_at;

		self.refresh_metrics.record_attempt();

		match self.transport.refresh(current.refresh_token.expose()).await {
			Ok(response) => {
				let now = OffsetDateTime::now_utc();
				let mut refreshed = Credentials::from_token_response(&response, now);

				// The stored expiry must never regress: a shorter-lived replacement
				// would re-trigger the proactive path on every subsequent request. A
				// too-optimistic expiry is corrected by the reactive 401 path instead.
				if let (Some(candidate), Some(previous)) = (refreshed.expires_at, previous_expiry) {
					if candidate <= previous {
						refreshed.expires_at = Some(previous + Duration::SECOND);
					}
				}

				let access_token = refreshed.access_token.clone();

				if let Err(e) = self.store.save(refreshed).await {
					obs::warn_stage(Stage::Refresh, "Failed to persist refreshed credentials.", &e);
					self.refresh_metrics.record_failure();

					return self.terminate_session().await;
				}

				self.refresh_metrics.record_success();

				Some(access_token)
			},
			Err(e) => {
				obs::warn_stage(Stage::Refresh, "Refresh call failed; terminating session.", &e);
				self.refresh_metrics.record_failure();

				self.terminate_session().await
			},
		}
	}

	/// Clears the credential set and fires the session-terminated signal.
	///
	/// Only the leader ever gets here, and it fans out to the waiters afterwards, so
	/// the clear lands before any of them resumes and the signal fires exactly once per
	/// failed refresh.
	async fn terminate_session(&self) -> Option<TokenSecret> {
		if let Err(e) = self.store.clear().await {
			obs::warn_stage(Stage::Refresh, "Failed to clear credentials on teardown.", &e);
		}

		let observer = self.observer.read().clone();

		observer.on_session_terminated();

		None
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &matches!(&*self.state.lock(), RefreshState::Refreshing { .. }))
			.finish()
	}
}
