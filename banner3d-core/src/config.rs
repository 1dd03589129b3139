//! Banner configuration, loadable from TOML
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```toml
//! instanced = false
//!
//! [grid]
//! rows = 40
//! columns = 60
//!
//! [text]
//! text = "C K B"
//! top_color = 0x2dc26b
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BannerError, Result};
use crate::geometry::MAX_SEGMENTS;
use crate::glyphs::{DEFAULT_ORIGIN, DEFAULT_TEXT};
use crate::grid::MAX_CELLS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u32,
    pub columns: u32,
    pub cube_size: f32,
    pub gap: f32,
    /// Curve segments per rounded edge
    pub segments: u32,
    pub radius: f32,
    pub center: [f32; 3],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 145,
            columns: 145,
            cube_size: 100.0,
            gap: 10.0,
            segments: 6,
            radius: 6.0,
            center: [0.0, 0.0, 0.0],
        }
    }
}

/// Which material the raised cubes under the text get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LitMaterial {
    Glass,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub text: String,
    /// Grid cell `[x, z]` of the first glyph's top-left corner
    pub origin: [u32; 2],
    pub letter_spacing: u32,
    /// How far lit cubes rise above the grid
    pub lift: f32,
    pub plate_size: f32,
    pub plate_depth: f32,
    pub plate_radius: f32,
    pub top_color: u32,
    pub bottom_color: u32,
    pub material: LitMaterial,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            origin: [DEFAULT_ORIGIN.0, DEFAULT_ORIGIN.1],
            letter_spacing: 0,
            lift: 40.0,
            plate_size: 96.0,
            plate_depth: 5.0,
            plate_radius: 6.0,
            top_color: 0x2dc26b,
            bottom_color: 0x5784da,
            material: LitMaterial::Glass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub half_width: f32,
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Euler angles in degrees, XYZ order
    pub rotation: [f32; 3],
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            half_width: 700.0,
            half_height: 150.0,
            near: -100_000.0,
            far: 100_000.0,
            position: [-781.213_2, 681.902_53, 496.552_64],
            rotation: [-37.462_982, -33.830_828, -27.999_32],
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: u32,
    pub intensity: f32,
    pub position: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: 0xfff0dd,
            intensity: 20.0,
            position: [0.0, 50.0, 120.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enabled: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_zoom: 0.05,
            max_zoom: 20.0,
            enable_damping: false,
            damping_factor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Draw the grid as one instanced mesh. Skips the text plates.
    pub instanced: bool,
    pub background: u32,
    pub grid: GridConfig,
    pub text: TextConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub controls: ControlsConfig,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            instanced: false,
            background: 0x000000,
            grid: GridConfig::default(),
            text: TextConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

impl BannerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::info!("loading banner config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.rows == 0 || grid.columns == 0 {
            return Err(BannerError::InvalidGrid(format!(
                "grid needs at least one cell, got {} rows x {} columns",
                grid.rows, grid.columns
            )));
        }
        let cells = u64::from(grid.rows) * u64::from(grid.columns);
        if cells > MAX_CELLS {
            return Err(BannerError::InvalidGrid(format!(
                "{} rows x {} columns is {cells} cells, more than {MAX_CELLS}",
                grid.rows, grid.columns
            )));
        }
        if grid.segments > MAX_SEGMENTS {
            return Err(BannerError::InvalidGeometry(format!(
                "{} edge segments is more than {MAX_SEGMENTS}",
                grid.segments
            )));
        }
        if !(grid.cube_size > 0.0) || !(grid.gap >= 0.0) || !(grid.radius >= 0.0) {
            return Err(BannerError::InvalidGeometry(format!(
                "cube size {} must be positive, gap {} and radius {} non-negative",
                grid.cube_size, grid.gap, grid.radius
            )));
        }
        let text = &self.text;
        if !(text.plate_size > 0.0) || !(text.plate_depth > 0.0) || !(text.plate_radius >= 0.0) {
            return Err(BannerError::InvalidGeometry(format!(
                "plate {}x{} with radius {} is not a valid box",
                text.plate_size, text.plate_depth, text.plate_radius
            )));
        }
        let camera = &self.camera;
        if !(camera.zoom > 0.0) || !(camera.half_width > 0.0) || !(camera.half_height > 0.0) {
            return Err(BannerError::InvalidGeometry(format!(
                "camera frustum {}x{} at zoom {} is degenerate",
                camera.half_width, camera.half_height, camera.zoom
            )));
        }
        if !(camera.far > camera.near) {
            return Err(BannerError::InvalidGeometry(format!(
                "camera far plane {} must lie beyond near plane {}",
                camera.far, camera.near
            )));
        }
        Ok(())
    }
}
