//! Example: spell the banner with a glyph table loaded from disk
//!
//! Usage: cargo run --example custom_font -- path/to/font.glyphs "TEXT"
use anyhow::Context;
use banner3d_core::{BannerConfig, Font};
use banner3d_terminal::TerminalApp;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let font = match args.get(1) {
        Some(path) => {
            println!("Loading glyph table: {}", path);
            Font::load(path).with_context(|| format!("failed to load {}", path))?
        }
        None => {
            eprintln!("Usage: {} <glyph-file> [text]", args[0]);
            eprintln!("\nNo glyph file provided, using the built-in table...");
            Font::builtin()?
        }
    };

    let mut config = BannerConfig::default();
    // Smaller grid so the text sits near the middle of the screen
    config.grid.rows = 40;
    config.grid.columns = 60;
    if let Some(text) = args.get(2) {
        config.text.text = text.clone();
    }
    config.validate()?;

    println!("Loaded {} glyphs", font.len());
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(&config, &font, 30)?;
    app.run()?;
    Ok(())
}
