//! In-memory [`SessionStore`] backed by a shared lock.

// self
use crate::{_prelude::*, session::{SessionSnapshot, SessionStore, TokenSecret}};

/// Process-local session store. Clones share the same underlying cell.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<SessionSnapshot>>);
impl MemoryStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces both credentials at once.
	pub fn set_session(&self, access_token: Option<TokenSecret>, refresh_token: Option<TokenSecret>) {
		*self.0.write() = SessionSnapshot { access_token, refresh_token };
	}

	/// Drops both credentials.
	pub fn clear(&self) {
		*self.0.write() = SessionSnapshot::default();
	}
}
impl SessionStore for MemoryStore {
	fn snapshot(&self) -> SessionSnapshot {
		self.0.read().clone()
	}

	fn set_access_token(&self, token: TokenSecret) {
		self.0.write().access_token = Some(token);
	}
}
