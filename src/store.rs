//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, credential::Credentials};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable home of the single credential set shared by every gated request.
///
/// The store is the only component that retains credentials across calls; every read
/// goes through [`load`](CredentialStore::load). Reads are never blocked by an
/// in-flight refresh, and writes replace or clear the whole set in one step —
/// implementations must never expose a partially updated set.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Atomically replaces the stored credential set.
	fn save(&self, credentials: Credentials) -> StoreFuture<'_, ()>;

	/// Returns the current credential set, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<Credentials>>;

	/// Atomically removes the stored credential set.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
