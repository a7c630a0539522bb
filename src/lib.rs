//! Authenticated API client for the Blocks platform - a session-refreshing request executor,
//! typed UILM language endpoints, and a key-mode translation runtime in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod i18n;
pub mod obs;
pub mod session;
pub mod uilm;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::BlocksClient,
		config::ClientConfig,
		http::HttpTransport,
		session::{MemoryStore, SessionStore, TokenSecret},
	};

	/// Project key fixture shared across tests.
	pub const TEST_PROJECT_KEY: &str = "EF83CA37DE4F438AAD4DE4B1AB2B91F0";

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.referer(false)
			.danger_accept_invalid_certs(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs a [`BlocksClient`] from a fully prepared configuration, returning the backing
	/// in-memory store alongside it.
	pub fn build_test_client_with(config: ClientConfig) -> (BlocksClient, MemoryStore) {
		let store_backend = MemoryStore::new();
		let store: Arc<dyn SessionStore> = Arc::new(store_backend.clone());
		let client = BlocksClient::with_http_client(
			config,
			store,
			HttpTransport::with_client(test_reqwest_client()),
		);

		(client, store_backend)
	}

	/// Constructs a [`BlocksClient`] for the provided API base, backed by an in-memory session
	/// store.
	pub fn build_test_client(api_base: &str) -> (BlocksClient, MemoryStore) {
		let config =
			ClientConfig::parse(api_base, TEST_PROJECT_KEY).expect("API base fixture should parse.");

		build_test_client_with(config)
	}

	/// Seeds the store with the provided session tokens.
	pub fn seed_session(store: &MemoryStore, access: Option<&str>, refresh: Option<&str>) {
		store.set_session(access.map(TokenSecret::new), refresh.map(TokenSecret::new));
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
