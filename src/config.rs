//! Client configuration: API base, project key, and the environment mode derived from the
//! page origin.

// self
use crate::{_prelude::*, error::ConfigError};

/// Header carrying the fixed project key on every request.
pub const PROJECT_KEY_HEADER: &str = "x-blocks-key";

/// Where the embedding page is served from, as far as credential handling is concerned.
///
/// The mode is a pure function of the origin host and decides both credential channels at
/// once: local development attaches a bearer header and skips ambient cookies, deployed
/// origins do the opposite. No request ever carries both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
	/// Loopback or `localhost` origin; tokens travel in an `Authorization` header.
	LocalDevelopment,
	/// Any other origin; the ambient cookie jar carries the session.
	#[default]
	Deployed,
}
impl EnvironmentMode {
	/// Derives the mode from an origin URL.
	///
	/// `localhost`, any `*.localhost` subdomain, and the IPv4/IPv6 loopback ranges count as
	/// local development; everything else, unresolvable hosts included, is deployed.
	pub fn detect(origin: &Url) -> Self {
		match origin.host() {
			Some(url::Host::Domain(domain)) => {
				let domain = domain.to_ascii_lowercase();

				if domain == "localhost" || domain.ends_with(".localhost") {
					Self::LocalDevelopment
				} else {
					Self::Deployed
				}
			},
			Some(url::Host::Ipv4(ip)) if ip.is_loopback() => Self::LocalDevelopment,
			Some(url::Host::Ipv6(ip)) if ip.is_loopback() => Self::LocalDevelopment,
			_ => Self::Deployed,
		}
	}

	/// Stable label of this mode.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::LocalDevelopment => "local_development",
			Self::Deployed => "deployed",
		}
	}

	/// Whether requests should carry bearer headers instead of ambient cookies.
	pub fn is_local_development(&self) -> bool {
		matches!(self, Self::LocalDevelopment)
	}
}
impl Display for EnvironmentMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Everything the client needs to address and authenticate API calls.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base URL relative request targets are joined onto.
	pub api_base: Url,
	/// Origin the embedding page runs on; drives [`Self::mode`].
	pub origin: Url,
	/// Fixed project key attached to every request.
	pub project_key: String,
	/// Target of the token refresh endpoint, resolved like any other request target.
	pub refresh_target: String,
	/// Environment mode derived from [`Self::origin`].
	pub mode: EnvironmentMode,
}
impl ClientConfig {
	/// Refresh endpoint used unless [`Self::with_refresh_target`] overrides it.
	pub const DEFAULT_REFRESH_TARGET: &'static str = "authentication/v1/Token/Refresh";

	/// Creates a configuration whose origin defaults to the API base itself.
	pub fn new(api_base: Url, project_key: impl Into<String>) -> Self {
		let origin = api_base.clone();
		let mode = EnvironmentMode::detect(&origin);

		Self {
			api_base,
			origin,
			project_key: project_key.into(),
			refresh_target: Self::DEFAULT_REFRESH_TARGET.into(),
			mode,
		}
	}

	/// Parses the API base from a string and builds a configuration from it.
	pub fn parse(api_base: &str, project_key: impl Into<String>) -> Result<Self, ConfigError> {
		let api_base = Url::parse(api_base).map_err(|e| ConfigError::InvalidBase { source: e })?;

		Ok(Self::new(api_base, project_key))
	}

	/// Replaces the origin and re-derives the environment mode from it.
	pub fn with_origin(mut self, origin: Url) -> Self {
		self.mode = EnvironmentMode::detect(&origin);
		self.origin = origin;

		self
	}

	/// Replaces the refresh endpoint target.
	pub fn with_refresh_target(mut self, target: impl Into<String>) -> Self {
		self.refresh_target = target.into();

		self
	}

	/// Forces an environment mode, bypassing origin detection.
	pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
		self.mode = mode;

		self
	}
}
