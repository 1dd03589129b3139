//! banner3d terminal demo
//!
//! Renders the cube banner as colored ASCII.
//! Controls:
//!   - WASD / Arrow Keys / left drag: Orbit
//!   - +/- / mouse wheel: Zoom
//!   - IJKL / right drag: Pan
//!   - R: Reset view
//!   - Q/ESC: Quit
use anyhow::Context;
use banner3d_terminal::cli::Cli;
use banner3d_terminal::logging::init_logging;
use banner3d_terminal::TerminalApp;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config());

    let config = cli.banner_config().context("invalid banner configuration")?;
    let font = cli.font().context("cannot load glyph table")?;

    let mut app = TerminalApp::new(&config, &font, cli.fps)?;
    app.run()?;

    log::info!("banner closed");
    Ok(())
}
