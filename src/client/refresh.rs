//! Expired-session recovery: one refresh, one replay.
//!
//! A `401` on any request hands control to [`BlocksClient::recover_unauthorized`], which
//! exchanges the stored refresh token for a new access token and replays the original
//! request a single time. The replay classifies terminally, so a session that comes back
//! expired again surfaces as an ordinary application error instead of looping. Concurrent
//! expiries each run their own exchange; the store's last write wins and every replay reads
//! whichever token is current.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use reqwest::{StatusCode, header::HeaderMap};
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	client::{ApiRequest, BlocksClient},
	error::{ApiError, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::TokenSecret,
};

impl BlocksClient {
	/// Recovers from an expired session, then replays the original request once.
	pub(crate) async fn recover_unauthorized<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "recover_unauthorized");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.refresh_then_replay(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn refresh_then_replay<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.refresh_session().await?;
		self.refresh_metrics.record_replay();

		let response = self.dispatch(request).await?;

		if response.status().is_success() {
			return Self::decode(response).await;
		}

		// A second expiry is an ordinary application error; no further refresh runs.
		Err(Self::application_error(response).await)
	}

	async fn refresh_session(&self) -> Result<()> {
		self.refresh_metrics.record_attempt();

		let outcome = self.exchange_refresh_token().await;

		match &outcome {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		outcome
	}

	/// Presents the refresh token to the refresh endpoint and stores the replacement
	/// access token.
	///
	/// The endpoint's reply is classified by body shape: an `invalid_request` marker is a
	/// rejection, an `access_token` field is a success, and anything else counts as a
	/// rejection too. Rejections leave the stored session untouched.
	async fn exchange_refresh_token(&self) -> Result<()> {
		let snapshot = self.store.snapshot();
		let Some(refresh_token) = snapshot.refresh_token.as_ref() else {
			return Err(ApiError::invalid_request().into());
		};
		let url = self.resolve_target(&self.config.refresh_target)?;
		let headers = self.build_headers(&snapshot, &HeaderMap::new())?;
		let response = self
			.transport
			.post(url)
			.headers(headers)
			.json(&json!({ "refresh_token": refresh_token.expose() }))
			.send()
			.await
			.map_err(TransportError::from)?;
		let body = Self::decode::<Value>(response).await?;

		if body.get("error").and_then(Value::as_str) == Some("invalid_request") {
			return Err(ApiError::new(StatusCode::UNAUTHORIZED.as_u16(), body).into());
		}

		let token = body.get("access_token").and_then(Value::as_str).map(TokenSecret::new);

		match token {
			Some(token) => {
				self.store.set_access_token(token);

				Ok(())
			},
			None => Err(ApiError::new(StatusCode::UNAUTHORIZED.as_u16(), body).into()),
		}
	}
}
