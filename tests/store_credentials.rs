// crates.io
use time::{Duration, macros};
// self
use bearer_gate::{
	credential::{Credentials, TokenSecret},
	store::{CredentialStore, MemoryStore},
};

fn build_credentials(access: &str, refresh: &str) -> Credentials {
	let issued = macros::datetime!(2026-08-23 12:00 UTC);

	Credentials {
		access_token: TokenSecret::new(access),
		refresh_token: TokenSecret::new(refresh),
		expires_at: Some(issued + Duration::hours(1)),
	}
}

#[tokio::test]
async fn save_and_load_round_trip() {
	let store = MemoryStore::default();
	let credentials = build_credentials("access-1", "refresh-1");

	store
		.save(credentials.clone())
		.await
		.expect("Saving credentials into the memory store should succeed.");

	let loaded = store
		.load()
		.await
		.expect("Loading credentials from the memory store should succeed.")
		.expect("Stored credentials should remain present.");

	assert_eq!(loaded.access_token.expose(), credentials.access_token.expose());
	assert_eq!(loaded.refresh_token.expose(), credentials.refresh_token.expose());
	assert_eq!(loaded.expires_at, credentials.expires_at);
}

#[tokio::test]
async fn save_replaces_the_whole_set() {
	let store = MemoryStore::default();

	store
		.save(build_credentials("access-old", "refresh-old"))
		.await
		.expect("Saving the initial set should succeed.");
	store
		.save(build_credentials("access-new", "refresh-new"))
		.await
		.expect("Saving the replacement set should succeed.");

	let loaded = store
		.load()
		.await
		.expect("Loading the replacement set should succeed.")
		.expect("Replacement set should remain present.");

	// Both halves come from the replacement. A mixed set would pair an access token
	// with a refresh token the backend no longer recognizes.
	assert_eq!(loaded.access_token.expose(), "access-new");
	assert_eq!(loaded.refresh_token.expose(), "refresh-new");
}

#[tokio::test]
async fn clear_removes_the_set() {
	let store = MemoryStore::default();

	store
		.save(build_credentials("access", "refresh"))
		.await
		.expect("Saving credentials should succeed.");
	store.clear().await.expect("Clearing the memory store should succeed.");

	let loaded = store.load().await.expect("Loading after clear should succeed.");

	assert!(loaded.is_none());
}

#[tokio::test]
async fn clear_is_idempotent_on_an_empty_store() {
	let store = MemoryStore::default();

	store.clear().await.expect("Clearing an empty store should succeed.");

	let loaded = store.load().await.expect("Loading an empty store should succeed.");

	assert!(loaded.is_none());
}
