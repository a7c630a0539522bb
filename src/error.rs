//! Client-level error types shared across the request executor, session layer, and endpoints.
//!
//! Every failure carries an HTTP-status-shaped code: application errors keep the status the
//! server answered with, while transport and configuration failures are tagged with
//! [`TransportError::STATUS`] so callers can branch on one numeric axis.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Server answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Request never produced a decodable server answer.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// HTTP-status-shaped code of this failure.
	///
	/// Application errors report the actual response status; everything that never yielded a
	/// server verdict reports [`TransportError::STATUS`].
	pub fn status(&self) -> u16 {
		match self {
			Self::Api(e) => e.status,
			Self::Transport(_) | Self::Config(_) => TransportError::STATUS,
		}
	}
}

/// Structured application failure: the server answered, and the answer was an error.
///
/// The display form follows the surfaced-message rule: if the response body carries a string
/// `message` field, that string is the message; otherwise the whole body is serialized.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{}", surface_message(.body))]
pub struct ApiError {
	/// HTTP status code the server answered with.
	pub status: u16,
	/// Parsed response body.
	pub body: Value,
}
impl ApiError {
	/// Constructs an application error from a response status and parsed body.
	pub fn new(status: u16, body: Value) -> Self {
		Self { status, body }
	}

	/// The canonical rejection raised when no refresh credential is on hand.
	pub fn invalid_request() -> Self {
		Self::new(401, serde_json::json!({ "error": "invalid_request" }))
	}

	/// Human-oriented message for this failure.
	pub fn message(&self) -> String {
		surface_message(&self.body)
	}
}

fn surface_message(body: &Value) -> String {
	match body.get("message") {
		Some(Value::String(message)) => message.clone(),
		_ => body.to_string(),
	}
}

/// Failures where no server verdict exists: the wire broke, or the answer was undecodable.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Server answer could not be decoded as the expected JSON shape.
	#[error("API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request target could not be assembled into a valid URL.
	#[error("Request target is not a valid URL.")]
	Target {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl TransportError {
	/// Status code standing in for every failure that never produced a server verdict.
	pub const STATUS: u16 = 500;

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}
impl From<url::ParseError> for TransportError {
	fn from(e: url::ParseError) -> Self {
		Self::Target { source: e }
	}
}

/// Configuration and validation failures raised while assembling the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API base is not a parseable URL.
	#[error("API base is not a valid URL.")]
	InvalidBase {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A computed header value contains bytes HTTP forbids.
	#[error("Header `{name}` carries an invalid value.")]
	InvalidHeaderValue {
		/// Header the value was destined for.
		name: &'static str,
		/// Underlying validation failure.
		#[source]
		source: reqwest::header::InvalidHeaderValue,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}
