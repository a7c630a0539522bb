//! Transport primitives shared by every request the client sends.
//!
//! The module exposes [`HttpTransport`], a thin wrapper around [`ReqwestClient`] so the
//! mode-dependent transport policy lives in one place. Browsers attach a referrer and an
//! ambient cookie jar on their own; a native client has to opt in explicitly, and
//! [`HttpTransport::for_mode`] encodes which of those a given environment gets.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, config::EnvironmentMode, error::ConfigError};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Every transport suppresses the `Referer` header, mirroring the strict no-referrer policy
/// the executor promises for all attempts. Cookie handling is mode-dependent: deployed
/// environments carry the session in an ambient cookie jar, local development does not.
#[derive(Clone, Debug)]
pub struct HttpTransport(pub ReqwestClient);
impl HttpTransport {
	/// Builds the transport appropriate for an environment mode.
	pub fn for_mode(mode: EnvironmentMode) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().referer(false);

		if !mode.is_local_development() {
			builder = builder.cookie_store(true);
		}

		Ok(Self(builder.build()?))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// The caller owns the policy decisions here; configure the client to suppress referrers
	/// and to carry cookies only when the deployed mode needs them.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for HttpTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for HttpTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
