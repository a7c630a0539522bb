//! High-level request executor for the Blocks API.
//!
//! [`BlocksClient`] owns the transport, configuration, and session store so callers can issue
//! typed requests without touching credentials. Every call follows the same protocol: resolve
//! the target against the API base, attach the computed headers, send, then classify the
//! response. A `401` means the session expired; the client refreshes it once and replays the
//! original request once, and any outcome after that replay is final.

pub mod refresh;

pub use refresh::RefreshMetrics;

// crates.io
use reqwest::{
	Method, Response, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, IntoHeaderName},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	config::{ClientConfig, PROJECT_KEY_HEADER},
	error::{ApiError, ConfigError, TransportError},
	http::HttpTransport,
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{SessionSnapshot, SessionStore},
};

/// One API call: the target, method, and caller-supplied header overrides.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// Absolute URL or base-relative path identifying the endpoint.
	pub target: String,
	/// HTTP method the endpoint expects.
	pub method: Method,
	/// Caller-supplied headers; these win over every computed header on collision.
	pub headers: HeaderMap,
}
impl ApiRequest {
	/// Creates a GET request for the target.
	pub fn get(target: impl Into<String>) -> Self {
		Self { target: target.into(), method: Method::GET, headers: HeaderMap::new() }
	}

	/// Adds a header override, replacing the computed value of the same name.
	pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}
}

/// Executes authenticated requests against the Blocks API.
///
/// The session store is consulted afresh before every attempt, so a token written by a
/// concurrent refresh is picked up without coordination. The client never holds a lock
/// across a request.
#[derive(Clone)]
pub struct BlocksClient {
	/// Addressing, project key, and environment mode applied to every request.
	pub config: ClientConfig,
	/// Session store read before each attempt and updated after a refresh.
	pub store: Arc<dyn SessionStore>,
	/// Shared metrics recorder for session refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	transport: HttpTransport,
}
impl BlocksClient {
	/// Creates a client whose transport matches the configured environment mode.
	pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
		let transport = HttpTransport::for_mode(config.mode)?;

		Ok(Self::with_http_client(config, store, transport))
	}

	/// Creates a client that reuses a caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		transport: HttpTransport,
	) -> Self {
		Self { config, store, refresh_metrics: Default::default(), transport }
	}

	/// Sends a GET request to the target and decodes the response body.
	pub async fn get<T>(&self, target: impl Into<String>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.request(&ApiRequest::get(target)).await
	}

	/// Executes a request end to end, recovering an expired session at most once.
	pub async fn request<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "request");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.classify_first_attempt(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn classify_first_attempt<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.dispatch(request).await?;
		let status = response.status();

		if status.is_success() {
			return Self::decode(response).await;
		}
		if status == StatusCode::UNAUTHORIZED {
			// The expired attempt's body is dropped; recovery re-derives the outcome.
			return self.recover_unauthorized(request).await;
		}

		Err(Self::application_error(response).await)
	}

	/// Resolves the request target, attaches the computed headers from a fresh session
	/// snapshot, and sends it over the wire.
	pub(crate) async fn dispatch(&self, request: &ApiRequest) -> Result<Response> {
		let url = self.resolve_target(&request.target)?;
		let snapshot = self.store.snapshot();
		let headers = self.build_headers(&snapshot, &request.headers)?;

		Ok(self
			.transport
			.request(request.method.clone(), url)
			.headers(headers)
			.send()
			.await
			.map_err(TransportError::from)?)
	}

	/// Resolves a target into an absolute URL.
	///
	/// Targets that already name a scheme pass through untouched. Anything else joins the
	/// configured API base with exactly one slash, however many either side carries.
	pub(crate) fn resolve_target(&self, target: &str) -> Result<Url, TransportError> {
		if target.starts_with("http") {
			return Ok(Url::parse(target)?);
		}

		let base = self.config.api_base.as_str().trim_end_matches('/');
		let path = target.trim_start_matches('/');

		Ok(Url::parse(&format!("{base}/{path}"))?)
	}

	/// Computes the headers for one attempt.
	///
	/// JSON content type and the project key are always present. The bearer header appears
	/// only in local development mode and only when the snapshot holds an access token.
	/// Caller overrides land last and win on collision.
	pub(crate) fn build_headers(
		&self,
		snapshot: &SessionSnapshot,
		overrides: &HeaderMap,
	) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(
			HeaderName::from_static(PROJECT_KEY_HEADER),
			HeaderValue::from_str(&self.config.project_key)
				.map_err(|e| ConfigError::InvalidHeaderValue { name: PROJECT_KEY_HEADER, source: e })?,
		);

		if self.config.mode.is_local_development()
			&& let Some(token) = snapshot.access_token.as_ref()
		{
			let value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
				.map_err(|e| ConfigError::InvalidHeaderValue { name: "authorization", source: e })?;

			headers.insert(AUTHORIZATION, value);
		}
		for (name, value) in overrides {
			headers.insert(name, value.clone());
		}

		Ok(headers)
	}

	/// Decodes a success body into the caller's type.
	pub(crate) async fn decode<T>(response: Response) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let bytes = response.bytes().await.map_err(TransportError::from)?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		Ok(serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| TransportError::Decode { source: e })?)
	}

	/// Turns a non-success response into the error the caller sees, keeping the server's
	/// status and parsed body together.
	pub(crate) async fn application_error(response: Response) -> Error {
		let status = response.status().as_u16();

		match Self::decode::<Value>(response).await {
			Ok(body) => ApiError::new(status, body).into(),
			Err(e) => e,
		}
	}
}
impl Debug for BlocksClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BlocksClient")
			.field("config", &self.config)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, config::EnvironmentMode, session::TokenSecret};

	fn snapshot(access: Option<&str>, refresh: Option<&str>) -> SessionSnapshot {
		SessionSnapshot {
			access_token: access.map(TokenSecret::new),
			refresh_token: refresh.map(TokenSecret::new),
		}
	}

	fn local_client() -> BlocksClient {
		build_test_client("http://localhost:8080/api/").0
	}

	#[test]
	fn relative_targets_join_with_exactly_one_slash() {
		let client = local_client();
		let targets = ["demo/v1/Widget/Get", "/demo/v1/Widget/Get", "///demo/v1/Widget/Get"];

		for target in targets {
			let url = client.resolve_target(target).expect("Target should resolve.");

			assert_eq!(url.as_str(), "http://localhost:8080/api/demo/v1/Widget/Get", "{target}");
		}
	}

	#[test]
	fn absolute_targets_pass_through() {
		let client = local_client();
		let url = client
			.resolve_target("https://elsewhere.example/demo/v1/Widget/Get")
			.expect("Target should resolve.");

		assert_eq!(url.as_str(), "https://elsewhere.example/demo/v1/Widget/Get");
	}

	#[test]
	fn development_mode_attaches_bearer_only_with_a_token() {
		let client = local_client();
		let headers = client
			.build_headers(&snapshot(Some("token-123"), None), &HeaderMap::new())
			.expect("Headers should build.");

		assert_eq!(
			headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer token-123")
		);
		assert_eq!(
			headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
			Some("application/json")
		);
		assert_eq!(
			headers.get(PROJECT_KEY_HEADER).and_then(|v| v.to_str().ok()),
			Some(TEST_PROJECT_KEY)
		);

		let headers = client
			.build_headers(&snapshot(None, Some("refresh")), &HeaderMap::new())
			.expect("Headers should build.");

		assert!(headers.get(AUTHORIZATION).is_none());
	}

	#[test]
	fn deployed_mode_never_attaches_bearer() {
		let config = ClientConfig::parse("http://localhost:8080/api/", TEST_PROJECT_KEY)
			.expect("API base fixture should parse.")
			.with_environment_mode(EnvironmentMode::Deployed);
		let (client, _) = build_test_client_with(config);
		let headers = client
			.build_headers(&snapshot(Some("token-123"), Some("refresh")), &HeaderMap::new())
			.expect("Headers should build.");

		assert!(headers.get(AUTHORIZATION).is_none());
		assert!(headers.get(PROJECT_KEY_HEADER).is_some());
	}

	#[test]
	fn dispatch_headers_follow_the_store() {
		let (client, store) = build_test_client("http://localhost:8080/api/");

		seed_session(&store, Some("seeded-token"), None);

		let headers = client
			.build_headers(&store.snapshot(), &HeaderMap::new())
			.expect("Headers should build.");

		assert_eq!(
			headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer seeded-token")
		);
	}

	#[test]
	fn overrides_win_on_collision() {
		let client = local_client();
		let mut overrides = HeaderMap::new();

		overrides.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.blocks+json"));

		let headers = client
			.build_headers(&snapshot(Some("token-123"), None), &overrides)
			.expect("Headers should build.");

		assert_eq!(
			headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
			Some("application/vnd.blocks+json")
		);
		assert_eq!(
			headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer token-123")
		);
	}
}
