#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use bearer_gate::store::CredentialStore;

#[tokio::test]
async fn rejected_request_is_retried_once_with_the_refreshed_token() {
	let server = MockServer::start_async().await;
	let (client, store, observer) = common::gated_client(&server);

	// The stored token still looks fresh, so the gate attaches it as-is and the
	// server-side rejection is what triggers the refresh.
	common::seed(&store, "access-revoked", "refresh-live", Duration::hours(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).header("content-type", "application/json").body(common::TOKEN_BODY);
		})
		.await;
	let rejected_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/portfolios")
				.header("authorization", "Bearer access-revoked");
			then.status(401).body("{\"detail\":\"token revoked\"}");
		})
		.await;
	let accepted_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolios").header("authorization", "Bearer access-new");
			then.status(200).body("[]");
		})
		.await;
	let response = client
		.execute(common::get(server.url("/portfolios")))
		.await
		.expect("Recovered request should succeed.");

	assert_eq!(response.status(), 200);
	assert_eq!(observer.count(), 0);

	rejected_mock.assert_calls_async(1).await;
	refresh_mock.assert_calls_async(1).await;
	accepted_mock.assert_calls_async(1).await;

	let stored = store
		.load()
		.await
		.expect("Store load should succeed after recovery.")
		.expect("Credentials should remain present after recovery.");

	assert_eq!(stored.access_token.expose(), "access-new");
}

#[tokio::test]
async fn persistent_rejection_is_returned_after_a_single_retry() {
	let server = MockServer::start_async().await;
	let (client, store, observer) = common::gated_client(&server);

	common::seed(&store, "access-unwanted", "refresh-live", Duration::hours(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).header("content-type", "application/json").body(common::TOKEN_BODY);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/forbidden-report");
			then.status(401).body("{\"detail\":\"not for you\"}");
		})
		.await;
	let response = client
		.execute(common::get(server.url("/forbidden-report")))
		.await
		.expect("The final rejection should surface as a response, not an error.");

	assert_eq!(response.status(), 401);
	assert_eq!(observer.count(), 0);

	api_mock.assert_calls_async(2).await;
	refresh_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn revoked_refresh_token_terminates_the_session_once() {
	let server = MockServer::start_async().await;
	let (client, store, observer) = common::gated_client(&server);

	common::seed(&store, "access-dead", "refresh-dead", Duration::hours(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401).body("{\"detail\":\"refresh token revoked\"}");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolios").header("authorization", "Bearer access-dead");
			then.status(401).body("{\"detail\":\"token revoked\"}");
		})
		.await;
	let (first, second, third) = tokio::join!(
		client.execute(common::get(server.url("/portfolios"))),
		client.execute(common::get(server.url("/portfolios"))),
		client.execute(common::get(server.url("/portfolios"))),
	);

	for response in [first, second, third] {
		let response =
			response.expect("The original rejection should surface as a response, not an error.");

		assert_eq!(response.status(), 401);
	}

	refresh_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(3).await;

	assert_eq!(observer.count(), 1);

	let remaining = store.load().await.expect("Store load should succeed after teardown.");

	assert!(remaining.is_none());
}

#[tokio::test]
async fn malformed_refresh_payload_terminates_the_session() {
	let server = MockServer::start_async().await;
	let (client, store, observer) = common::gated_client(&server);

	common::seed(&store, "access-dead", "refresh-live", Duration::hours(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":42}");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/portfolios");
			then.status(401).body("{\"detail\":\"token revoked\"}");
		})
		.await;
	let response = client
		.execute(common::get(server.url("/portfolios")))
		.await
		.expect("The original rejection should surface as a response, not an error.");

	assert_eq!(response.status(), 401);
	assert_eq!(observer.count(), 1);

	refresh_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(1).await;

	let remaining = store.load().await.expect("Store load should succeed after teardown.");

	assert!(remaining.is_none());
}
