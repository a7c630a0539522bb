// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use blocks_client::{
	client::BlocksClient,
	config::ClientConfig,
	error::Error,
	session::{MemoryStore, SessionStore, TokenSecret},
};

const PROJECT_KEY: &str = "EF83CA37DE4F438AAD4DE4B1AB2B91F0";
const WIDGET_PATH: &str = "/demo/v1/Widget/Get";
const REFRESH_PATH: &str = "/authentication/v1/Token/Refresh";

#[derive(Debug, PartialEq, Deserialize)]
struct Widget {
	id: u32,
	name: String,
}

fn config_for(server: &MockServer) -> ClientConfig {
	ClientConfig::parse(&server.url("/"), PROJECT_KEY).expect("Mock server URL should parse.")
}

fn build_client_with(config: ClientConfig) -> (BlocksClient, MemoryStore) {
	let store = MemoryStore::new();
	let client = BlocksClient::new(config, Arc::new(store.clone()))
		.expect("Client should build for the mock environment.");

	(client, store)
}

fn build_client(server: &MockServer) -> (BlocksClient, MemoryStore) {
	build_client_with(config_for(server))
}

fn seed(store: &MemoryStore, access: &str, refresh: &str) {
	store.set_session(Some(TokenSecret::new(access)), Some(TokenSecret::new(refresh)));
}

#[tokio::test]
async fn expired_sessions_refresh_once_and_replay() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	seed(&store, "stale-token", "refresh-token");

	let stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH).header("authorization", "Bearer stale-token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(REFRESH_PATH)
				.header("x-blocks-key", PROJECT_KEY)
				.json_body(json!({ "refresh_token": "refresh-token" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH).header("authorization", "Bearer fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":7,\"name\":\"anvil\"}");
		})
		.await;
	let widget = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect("Expired session should recover transparently.");

	stale_mock.assert_async().await;
	refresh_mock.assert_async().await;
	fresh_mock.assert_async().await;

	assert_eq!(widget, Widget { id: 7, name: "anvil".into() });

	let snapshot = store.snapshot();

	assert_eq!(snapshot.access_token.as_ref().map(|t| t.expose()), Some("fresh-token"));
	assert_eq!(snapshot.refresh_token.as_ref().map(|t| t.expose()), Some("refresh-token"));
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
	assert_eq!(client.refresh_metrics.replays(), 1);
	assert_eq!(client.refresh_metrics.failures(), 0);
}

#[tokio::test]
async fn second_expiry_surfaces_without_another_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	seed(&store, "stale-token", "refresh-token");

	server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH).header("authorization", "Bearer stale-token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"token_type\":\"bearer\"}");
		})
		.await;

	// The replay comes back expired as well; that answer must be final.
	server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH).header("authorization", "Bearer fresh-token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"still expired\"}");
		})
		.await;

	let err = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect_err("A second expiry should surface to the caller.");

	refresh_mock.assert_calls_async(1).await;

	assert_eq!(err.status(), 401);
	assert_eq!(err.to_string(), "still expired");
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.replays(), 1);
}

#[tokio::test]
async fn missing_refresh_token_is_terminal_without_wire_traffic() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	store.set_session(Some(TokenSecret::new("stale-token")), None);

	server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"never\"}");
		})
		.await;
	let err = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect_err("Recovery without a refresh token should fail.");

	refresh_mock.assert_calls_async(0).await;

	assert_eq!(err.status(), 401);

	match err {
		Error::Api(api) => assert_eq!(api.body, json!({ "error": "invalid_request" })),
		other => panic!("Expected an application error, got {other:?}"),
	}

	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert_eq!(client.refresh_metrics.replays(), 0);
}

#[tokio::test]
async fn refresh_rejection_leaves_the_session_untouched() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	seed(&store, "stale-token", "refresh-token");

	let widget_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;

	// Rejections are recognized by body shape, whatever the HTTP status says.
	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_request\",\"error_description\":\"refresh token expired\"}");
		})
		.await;

	let err = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect_err("A rejected refresh should fail the request.");

	widget_mock.assert_calls_async(1).await;

	assert_eq!(err.status(), 401);

	match err {
		Error::Api(api) => {
			assert_eq!(api.body["error"], "invalid_request");
			assert_eq!(api.body["error_description"], "refresh token expired");
		},
		other => panic!("Expected an application error, got {other:?}"),
	}

	let snapshot = store.snapshot();

	assert_eq!(snapshot.access_token.as_ref().map(|t| t.expose()), Some("stale-token"));
	assert_eq!(snapshot.refresh_token.as_ref().map(|t| t.expose()), Some("refresh-token"));
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert_eq!(client.refresh_metrics.replays(), 0);
}

#[tokio::test]
async fn unrecognized_refresh_replies_count_as_rejections() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	seed(&store, "stale-token", "refresh-token");

	server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;

	let err = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect_err("A tokenless refresh reply should fail the request.");

	assert_eq!(err.status(), 401);

	match err {
		Error::Api(api) => assert_eq!(api.body, json!({ "ok": true })),
		other => panic!("Expected an application error, got {other:?}"),
	}

	assert_eq!(
		store.snapshot().access_token.as_ref().map(|t| t.expose()),
		Some("stale-token")
	);
}

#[tokio::test]
async fn refresh_transport_failures_surface_as_transport_errors() {
	let server = MockServer::start_async().await;
	let config = config_for(&server)
		.with_refresh_target("http://127.0.0.1:1/authentication/v1/Token/Refresh");
	let (client, store) = build_client_with(config);

	seed(&store, "stale-token", "refresh-token");

	server
		.mock_async(|when, then| {
			when.method(GET).path(WIDGET_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"expired\"}");
		})
		.await;

	let err = client
		.get::<Widget>("demo/v1/Widget/Get")
		.await
		.expect_err("Nothing listens on the refresh port.");

	assert_eq!(err.status(), 500);
	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert_eq!(client.refresh_metrics.replays(), 0);
}

#[tokio::test]
async fn concurrent_expiries_each_run_their_own_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server);

	seed(&store, "stale-token", "refresh-token");

	for path in ["/demo/v1/Alpha/Get", "/demo/v1/Beta/Get"] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(path).header("authorization", "Bearer stale-token");
				then.status(401)
					.header("content-type", "application/json")
					.body("{\"message\":\"expired\"}");
			})
			.await;
	}

	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/demo/v1/Alpha/Get").header("authorization", "Bearer fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":1,\"name\":\"alpha\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/demo/v1/Beta/Get").header("authorization", "Bearer fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":2,\"name\":\"beta\"}");
		})
		.await;

	let (alpha, beta) = tokio::join!(
		client.get::<Widget>("demo/v1/Alpha/Get"),
		client.get::<Widget>("demo/v1/Beta/Get"),
	);
	let alpha = alpha.expect("Alpha request should recover.");
	let beta = beta.expect("Beta request should recover.");

	assert_eq!(alpha.id, 1);
	assert_eq!(beta.id, 2);
	assert_eq!(
		store.snapshot().access_token.as_ref().map(|t| t.expose()),
		Some("fresh-token")
	);

	// Without singleflight the callers may race into one or two exchanges; either way every
	// exchange succeeds and no caller sees a failure.
	let attempts = client.refresh_metrics.attempts();

	assert!((1..=2).contains(&attempts), "attempts = {attempts}");
	assert_eq!(client.refresh_metrics.successes(), attempts);
	assert_eq!(client.refresh_metrics.failures(), 0);
	assert_eq!(client.refresh_metrics.replays(), attempts);
}
