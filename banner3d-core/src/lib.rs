//! banner3d core library: the stateless pieces of the cube banner
//!
//! Geometry, transforms, the orthographic camera and its orbit controls, the
//! grid layout, the glyph table, and a small software rasterizer that both
//! front-ends draw with.

pub mod banner;
pub mod config;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod glyphs;
pub mod grid;
pub mod material;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod transform;

pub use nalgebra;

// Re-export commonly used types
pub use banner::Banner;
pub use config::{BannerConfig, LitMaterial};
pub use controls::OrbitControls;
pub use error::{BannerError, Result};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use glyphs::{text_cell_indexes, Font, Glyph};
pub use grid::GridLayout;
pub use material::{Color, DirectionalLight, Material};
pub use projection::OrthographicCamera;
pub use raster::{Framebuffer, Rasterizer, RenderStats};
pub use scene::{InstancedMesh, Node, Scene};
pub use transform::{Euler, Transform};
