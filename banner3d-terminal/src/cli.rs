//! Command line options for the terminal banner
use std::path::PathBuf;

use banner3d_core::{BannerConfig, Font, LitMaterial, Result};
use clap::Parser;

use crate::logging::LoggingConfig;

/// Edge segments used when neither a config file nor `--segments` picks one.
/// A cube covers only a few character cells, so finer rounding is invisible.
pub const TERMINAL_SEGMENTS: u32 = 2;

#[derive(Debug, Parser)]
#[command(name = "banner3d-terminal", version, about = "Cube grid banner rendered in the terminal")]
pub struct Cli {
    /// TOML file with banner settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Glyph table to spell the text with instead of the built-in one
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Text spelled by the raised cubes
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long)]
    pub rows: Option<u32>,

    #[arg(long)]
    pub columns: Option<u32>,

    /// Curve segments per rounded cube edge [default: 2 without --config]
    #[arg(long)]
    pub segments: Option<u32>,

    /// Initial camera zoom; values below 1 show more of the grid
    #[arg(long)]
    pub zoom: Option<f32>,

    /// Draw the grid as one instanced mesh, without text
    #[arg(long)]
    pub instanced: bool,

    /// Keep the camera fixed
    #[arg(long)]
    pub no_controls: bool,

    /// Color the raised cubes by surface normal
    #[arg(long)]
    pub normal_material: bool,

    /// Frame rate cap
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Log filter, e.g. "debug" or "banner3d_core=trace"
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Write log lines to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Config file (or defaults) with the command line overrides applied.
    pub fn banner_config(&self) -> Result<BannerConfig> {
        let mut config = match &self.config {
            Some(path) => BannerConfig::load(path)?,
            None => BannerConfig::default(),
        };

        if let Some(text) = &self.text {
            config.text.text = text.clone();
        }
        if let Some(rows) = self.rows {
            config.grid.rows = rows;
        }
        if let Some(columns) = self.columns {
            config.grid.columns = columns;
        }
        match self.segments {
            Some(segments) => config.grid.segments = segments,
            None if self.config.is_none() => config.grid.segments = TERMINAL_SEGMENTS,
            None => {}
        }
        if let Some(zoom) = self.zoom {
            config.camera.zoom = zoom;
        }
        if self.instanced {
            config.instanced = true;
        }
        if self.no_controls {
            config.controls.enabled = false;
        }
        if self.normal_material {
            config.text.material = LitMaterial::Normal;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn font(&self) -> Result<Font> {
        match &self.font {
            Some(path) => Font::load(path),
            None => Font::builtin(),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log_filter.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banner3d_core::BannerError;

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["banner3d-terminal"]).unwrap();
        assert_eq!(cli.fps, 30);
        let mut expected = BannerConfig::default();
        expected.grid.segments = TERMINAL_SEGMENTS;
        assert_eq!(cli.banner_config().unwrap(), expected);
        assert_eq!(cli.font().unwrap().len(), 4);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "banner3d-terminal",
            "--rows",
            "40",
            "--columns",
            "50",
            "--text",
            "KB",
            "--zoom",
            "0.25",
            "--no-controls",
            "--normal-material",
        ])
        .unwrap();
        let config = cli.banner_config().unwrap();
        assert_eq!(config.grid.rows, 40);
        assert_eq!(config.grid.columns, 50);
        assert_eq!(config.text.text, "KB");
        assert_eq!(config.camera.zoom, 0.25);
        assert!(!config.controls.enabled);
        assert_eq!(config.text.material, LitMaterial::Normal);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::try_parse_from(["banner3d-terminal", "--rows", "0"]).unwrap();
        assert!(cli.banner_config().is_err());
    }

    #[test]
    fn test_oversized_overrides_are_rejected() {
        let cli = Cli::try_parse_from([
            "banner3d-terminal",
            "--rows",
            "4294967295",
            "--columns",
            "4294967295",
            "--instanced",
        ])
        .unwrap();
        assert!(matches!(
            cli.banner_config(),
            Err(BannerError::InvalidGrid(_))
        ));

        let cli = Cli::try_parse_from(["banner3d-terminal", "--segments", "100000"]).unwrap();
        assert!(matches!(
            cli.banner_config(),
            Err(BannerError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_config_file_keeps_its_segments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.toml");
        std::fs::write(&path, "[grid]\nrows = 40\n").unwrap();
        let path = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["banner3d-terminal", "--config", path.as_str()]).unwrap();
        let config = cli.banner_config().unwrap();
        assert_eq!(config.grid.rows, 40);
        assert_eq!(config.grid.segments, BannerConfig::default().grid.segments);
    }
}
