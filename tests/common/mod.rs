//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use bearer_gate::{
	coordinator::SessionObserver,
	credential::{Credentials, TokenSecret},
	store::{CredentialStore, MemoryStore},
	transport::HttpRequest,
};

/// Token payload the mock refresh endpoint answers with.
pub const TOKEN_BODY: &str = "{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":3600}";

/// Session observer that counts termination signals for assertions.
#[derive(Debug, Default)]
pub struct CountingObserver(AtomicU64);
impl CountingObserver {
	/// Returns the number of termination signals observed so far.
	pub fn count(&self) -> u64 {
		self.0.load(Ordering::SeqCst)
	}
}
impl SessionObserver for CountingObserver {
	fn on_session_terminated(&self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

/// Builds a credential set expiring `expires_in` from now.
pub fn credentials(access: &str, refresh: &str, expires_in: Duration) -> Credentials {
	Credentials {
		access_token: TokenSecret::new(access),
		refresh_token: TokenSecret::new(refresh),
		expires_at: Some(OffsetDateTime::now_utc() + expires_in),
	}
}

/// Seeds `store` with a credential set expiring `expires_in` from now.
pub async fn seed(store: &MemoryStore, access: &str, refresh: &str, expires_in: Duration) {
	store
		.save(credentials(access, refresh, expires_in))
		.await
		.expect("Failed to seed credentials into the store.");
}

/// Builds an empty-bodied GET request for the provided URL.
pub fn get(url: String) -> HttpRequest {
	http::Request::builder()
		.method("GET")
		.uri(url)
		.body(Vec::new())
		.expect("GET request fixture should build successfully.")
}

/// Builds an empty-bodied POST request for the provided URL.
pub fn post(url: String) -> HttpRequest {
	http::Request::builder()
		.method("POST")
		.uri(url)
		.body(Vec::new())
		.expect("POST request fixture should build successfully.")
}

/// Constructs a reqwest-backed [`GatedClient`](bearer_gate::client::GatedClient) wired
/// to the mock server's refresh endpoint, returning the store backend and observer for
/// assertions.
#[cfg(feature = "reqwest")]
pub fn gated_client(
	server: &httpmock::MockServer,
) -> (bearer_gate::client::ReqwestGatedClient, Arc<MemoryStore>, Arc<CountingObserver>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let observer = Arc::new(CountingObserver::default());
	let endpoint = url::Url::parse(&server.url("/auth/refresh"))
		.expect("Mock refresh endpoint should parse successfully.");
	let client = bearer_gate::client::GatedClient::new(store, endpoint)
		.with_session_observer(observer.clone());

	(client, store_backend, observer)
}
