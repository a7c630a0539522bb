//! Demonstrates the key-mode display toggle driven by host messages, including the single
//! re-render notification per actual transition.

// crates.io
use color_eyre::Result;
// self
use blocks_client::i18n::{Catalog, KeyModeMessage, Translator};

fn main() -> Result<()> {
	color_eyre::install()?;

	let translator = Translator::new();
	let catalog = serde_json::from_str::<Catalog>(
		"{\"app.title\":\"Events\",\"app.greeting\":\"Welcome {{name}}\"}",
	)?;

	translator.install_catalog("en-US", catalog);

	println!("values: {}", translator.translate_with("app.greeting", &[("name", "Ada")]));

	let toggle_on =
		serde_json::from_str::<KeyModeMessage>("{\"action\":\"keymode\",\"keymode\":true}")?;

	match translator.apply(&toggle_on) {
		Some(event) => println!("transition: {event:?}"),
		None => println!("no transition"),
	}

	println!("keys: {}", translator.translate_with("app.greeting", &[("name", "Ada")]));

	// A duplicate delivery of the same message is absorbed.
	match translator.apply(&toggle_on) {
		Some(event) => println!("transition: {event:?}"),
		None => println!("no transition"),
	}

	let toggle_off =
		serde_json::from_str::<KeyModeMessage>("{\"action\":\"keymode\",\"keymode\":false}")?;

	if let Some(event) = translator.apply(&toggle_off) {
		println!("transition: {event:?}");
	}

	println!("values again: {}", translator.translate("app.title"));

	Ok(())
}
