//! Typed bindings for the UILM localization endpoints.
//!
//! Two read paths cover the translation workflow: `Language/Gets` lists the languages a
//! project is configured for, and `Key/GetUilmFile` fetches one module's key/value catalog
//! in a given language. Both ride the regular executor, so they inherit credential handling
//! and session recovery like any other call.

// self
use crate::{_prelude::*, client::BlocksClient, i18n::Catalog};

/// UILM module the embedded surface loads its catalogs from.
pub const MODULE_NAME: &str = "open_events";

const LANGUAGE_GETS: &str = "uilm/v1/Language/Gets";
const UILM_FILE_GET: &str = "uilm/v1/Key/GetUilmFile";

/// One language a project is configured for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
	/// Server-side identifier of the language entry.
	pub item_id: String,
	/// IETF-style code, e.g. `en-US`.
	pub language_code: String,
	/// Human-readable name shown in pickers.
	pub language_name: String,
	/// Whether the project marks this language as its default.
	pub is_default: bool,
}

impl BlocksClient {
	/// Lists the languages configured for the project.
	pub async fn languages(&self) -> Result<Vec<Language>> {
		let target = query_target(LANGUAGE_GETS, &[("ProjectKey", self.config.project_key.as_str())]);

		self.get(target).await
	}

	/// Fetches the key/value catalog for a language + module pair.
	pub async fn uilm_file(&self, language: &str, module: &str) -> Result<Catalog> {
		let target = query_target(UILM_FILE_GET, &[
			("Language", language),
			("ModuleName", module),
			("ProjectKey", self.config.project_key.as_str()),
		]);

		self.get(target).await
	}
}

/// Picks the language to activate: the preferred code when the project offers it, else the
/// project default.
pub fn choose_language<'a>(available: &'a [Language], preferred: &str) -> Option<&'a Language> {
	available
		.iter()
		.find(|language| language.language_code == preferred)
		.or_else(|| available.iter().find(|language| language.is_default))
}

fn query_target(path: &str, params: &[(&str, &str)]) -> String {
	let query = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();

	format!("{path}?{query}")
}
