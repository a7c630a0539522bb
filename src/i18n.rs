//! Key-mode translation runtime.
//!
//! [`Translator`] resolves UI strings from installed [`Catalog`]s and understands two
//! display modes: the normal one renders translated values, key mode renders the raw
//! catalog keys so editors can see what to translate. Hosts drive the mode over a small
//! `keymode` message, and every state change hands back a [`TranslationEvent`] exactly once
//! so embedders know when a re-render is due. Repeated messages carrying the current state
//! produce no event.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Language activated before any host preference arrives; doubles as the fallback for keys
/// missing from the active catalog.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// What [`Translator::translate`] renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TranslationMode {
	/// Resolve keys to their translated values.
	#[default]
	Values,
	/// Render the raw keys themselves.
	Keys,
}
impl TranslationMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TranslationMode::Values => "values",
			TranslationMode::Keys => "keys",
		}
	}
}
impl Display for TranslationMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Flat key/value translation catalog for one language, as served by the UILM file
/// endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(HashMap<String, String>);
impl Catalog {
	/// Looks up the raw value for a key.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the catalog holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<HashMap<String, String>> for Catalog {
	fn from(entries: HashMap<String, String>) -> Self {
		Self(entries)
	}
}
impl<K, V> FromIterator<(K, V)> for Catalog
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Mode-switch message hosts post into the embedded surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyModeMessage {
	/// Discriminator; only [`Self::ACTION`] messages are handled.
	pub action: String,
	/// Requested mode: `true` switches to key display.
	pub keymode: bool,
	/// Language hint some hosts attach; carried through but not applied by the mode switch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_lang: Option<String>,
}
impl KeyModeMessage {
	/// Action value identifying a mode-switch message.
	pub const ACTION: &'static str = "keymode";
}

/// State change worth a re-render, emitted at most once per actual transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationEvent {
	/// The active language changed.
	LanguageChanged {
		/// Newly active language code.
		language: String,
	},
	/// The display mode changed.
	ModeChanged {
		/// Newly active mode.
		mode: TranslationMode,
	},
}

#[derive(Debug)]
struct TranslatorState {
	catalogs: HashMap<String, Catalog>,
	language: String,
	fallback: String,
	mode: TranslationMode,
}

/// Thread-safe translation state: installed catalogs, the active language, and the display
/// mode.
#[derive(Debug)]
pub struct Translator {
	state: RwLock<TranslatorState>,
	generation: AtomicU64,
}
impl Translator {
	/// Creates a translator starting on [`DEFAULT_LANGUAGE`].
	pub fn new() -> Self {
		Self::with_language(DEFAULT_LANGUAGE)
	}

	/// Creates a translator whose initial language doubles as the fallback.
	pub fn with_language(language: impl Into<String>) -> Self {
		let language = language.into();

		Self {
			state: RwLock::new(TranslatorState {
				catalogs: HashMap::new(),
				fallback: language.clone(),
				language,
				mode: TranslationMode::default(),
			}),
			generation: AtomicU64::new(0),
		}
	}

	/// Installs or replaces the catalog for a language.
	pub fn install_catalog(&self, language: impl Into<String>, catalog: Catalog) {
		self.state.write().catalogs.insert(language.into(), catalog);
		self.bump();
	}

	/// Returns the active language code.
	pub fn language(&self) -> String {
		self.state.read().language.clone()
	}

	/// Returns the active display mode.
	pub fn mode(&self) -> TranslationMode {
		self.state.read().mode
	}

	/// Monotonic counter that moves on every state change; useful for cache invalidation.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Relaxed)
	}

	/// Activates a language, reporting the transition when it actually changes anything.
	pub fn set_language(&self, language: impl Into<String>) -> Option<TranslationEvent> {
		let language = language.into();

		{
			let mut state = self.state.write();

			if state.language == language {
				return None;
			}

			state.language = language.clone();
		}

		self.bump();

		Some(TranslationEvent::LanguageChanged { language })
	}

	/// Switches the display mode, reporting the transition when it actually changes
	/// anything.
	pub fn set_mode(&self, mode: TranslationMode) -> Option<TranslationEvent> {
		{
			let mut state = self.state.write();

			if state.mode == mode {
				return None;
			}

			state.mode = mode;
		}

		self.bump();

		Some(TranslationEvent::ModeChanged { mode })
	}

	/// Applies a host message, reducing repeated deliveries to a single transition.
	///
	/// Messages with an unrecognized action are ignored.
	pub fn apply(&self, message: &KeyModeMessage) -> Option<TranslationEvent> {
		if message.action != KeyModeMessage::ACTION {
			return None;
		}

		self.set_mode(if message.keymode { TranslationMode::Keys } else { TranslationMode::Values })
	}

	/// Resolves a key for the active language.
	///
	/// Value resolution walks active catalog, then fallback catalog, then yields the key
	/// itself. Key mode short-circuits to the key.
	pub fn translate(&self, key: &str) -> String {
		let state = self.state.read();

		match state.mode {
			TranslationMode::Keys => key.into(),
			TranslationMode::Values => state
				.catalogs
				.get(&state.language)
				.and_then(|catalog| catalog.get(key))
				.or_else(|| state.catalogs.get(&state.fallback).and_then(|catalog| catalog.get(key)))
				.unwrap_or(key)
				.into(),
		}
	}

	/// Resolves a key, then substitutes `{{name}}` placeholders with the provided values.
	///
	/// Values land verbatim; nothing is HTML-escaped.
	pub fn translate_with(&self, key: &str, args: &[(&str, &str)]) -> String {
		let mut rendered = self.translate(key);

		for (name, value) in args {
			rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
		}

		rendered
	}

	fn bump(&self) {
		self.generation.fetch_add(1, Ordering::Relaxed);
	}
}
impl Default for Translator {
	fn default() -> Self {
		Self::new()
	}
}
