//! Session credential storage.
//!
//! The executor reads tokens through [`SessionStore`] and writes refreshed access tokens back
//! through it. Reads are synchronous snapshots and writes are single atomic assignments; the
//! store provides no mutual exclusion, so concurrent refreshes race benignly and the last
//! write wins.

pub mod memory;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Credential store the executor reads from and writes refreshed tokens into.
pub trait SessionStore: Send + Sync {
	/// Returns a point-in-time copy of the current session.
	fn snapshot(&self) -> SessionSnapshot;

	/// Replaces the access token, leaving the refresh token untouched.
	fn set_access_token(&self, token: TokenSecret);
}

/// Point-in-time copy of the stored session credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Bearer credential attached to requests in local development mode.
	pub access_token: Option<TokenSecret>,
	/// Credential presented to the refresh endpoint when the session expires.
	pub refresh_token: Option<TokenSecret>,
}

/// Token wrapper that redacts its value from every formatter.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a raw token string.
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	/// Reveals the raw token for constructing credentials.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(\"<redacted>\")")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
