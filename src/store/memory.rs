//! Thread-safe in-memory [`CredentialStore`] for tests and short-lived sessions.

// self
use crate::{
	_prelude::*,
	credential::Credentials,
	store::{CredentialStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<Credentials>>>;

/// Keeps the credential set in process memory; contents do not survive a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	fn save_now(slot: Slot, credentials: Credentials) {
		*slot.write() = Some(credentials);
	}

	fn load_now(slot: Slot) -> Option<Credentials> {
		slot.read().clone()
	}

	fn clear_now(slot: Slot) {
		*slot.write() = None;
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, credentials: Credentials) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::save_now(slot, credentials);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<Credentials>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::clear_now(slot);

			Ok(())
		})
	}
}
