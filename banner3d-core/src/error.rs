//! Error type shared by every banner operation
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BannerError {
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no glyph for character {0:?}")]
    UnknownGlyph(char),

    #[error("lit cell ({x}, {z}) lies outside the {columns}x{rows} grid")]
    GlyphOutOfBounds {
        x: u32,
        z: u32,
        rows: u32,
        columns: u32,
    },

    #[error("glyph table parse error at line {line}: {message}")]
    FontParse { line: usize, message: String },

    #[error("invalid glyph {glyph:?}: {message}")]
    InvalidFont { glyph: char, message: String },

    #[error("invalid banner config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BannerError>;
