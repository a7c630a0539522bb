//! Demonstrates listing a project's languages and feeding a UILM catalog into the
//! translator, served here by a local mock backend.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use blocks_client::{
	client::BlocksClient,
	config::ClientConfig,
	i18n::{DEFAULT_LANGUAGE, Translator},
	session::MemoryStore,
	uilm::{self, MODULE_NAME},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/uilm/v1/Language/Gets");
			then.status(200).header("content-type", "application/json").body(
				"[{\"itemId\":\"41\",\"languageCode\":\"en-US\",\"languageName\":\"English (US)\",\"isDefault\":true},{\"itemId\":\"42\",\"languageCode\":\"de-DE\",\"languageName\":\"Deutsch\",\"isDefault\":false}]",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/uilm/v1/Key/GetUilmFile").query_param("Language", "de-DE");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"app.greeting\":\"Willkommen {{name}}\"}");
		})
		.await;

	let config = ClientConfig::parse(&server.url("/"), "demo-project-key")?;
	let client = BlocksClient::new(config, Arc::new(MemoryStore::new()))?;
	let languages = client.languages().await?;

	for language in &languages {
		let marker = if language.is_default { " (default)" } else { "" };

		println!("{} - {}{marker}", language.language_code, language.language_name);
	}

	let chosen = uilm::choose_language(&languages, "de-DE")
		.map(|language| language.language_code.clone())
		.unwrap_or_else(|| DEFAULT_LANGUAGE.into());
	let catalog = client.uilm_file(&chosen, MODULE_NAME).await?;

	println!("Loaded {} catalog entries for {chosen}.", catalog.len());

	let translator = Translator::new();

	translator.install_catalog(chosen.clone(), catalog);

	if let Some(event) = translator.set_language(chosen) {
		println!("Re-render due: {event:?}.");
	}

	println!("{}", translator.translate_with("app.greeting", &[("name", "Ada")]));

	Ok(())
}
