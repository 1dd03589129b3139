//! Banner assembly: the cube grid, the lit text cells, light, camera and controls
use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::config::{BannerConfig, LitMaterial};
use crate::controls::OrbitControls;
use crate::error::{BannerError, Result};
use crate::geometry::Mesh;
use crate::glyphs::{text_cell_indexes, Font};
use crate::grid::{create_cubes, create_instanced_cubes, GridLayout};
use crate::material::{Color, DirectionalLight, Material};
use crate::projection::OrthographicCamera;
use crate::raster::{Framebuffer, Rasterizer, RenderStats};
use crate::scene::{Node, Scene};
use crate::transform::Euler;

/// A ready-to-draw banner: scene, camera and optional orbit controls.
pub struct Banner {
    pub scene: Scene,
    pub camera: OrthographicCamera,
    pub controls: Option<OrbitControls>,
    lit_cells: Vec<usize>,
    needs_redraw: bool,
    last_stats: RenderStats,
}

impl Banner {
    /// Build the banner with the built-in glyph table.
    pub fn new(config: &BannerConfig, viewport_width: u32, viewport_height: u32) -> Result<Self> {
        let font = Font::builtin()?;
        Self::with_font(config, &font, viewport_width, viewport_height)
    }

    pub fn with_font(
        config: &BannerConfig,
        font: &Font,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Self> {
        config.validate()?;
        if viewport_width == 0 || viewport_height == 0 {
            return Err(BannerError::InvalidGeometry(format!(
                "viewport {viewport_width}x{viewport_height} has no area"
            )));
        }

        let aspect = viewport_width as f32 / viewport_height as f32;
        let camera = build_camera(config, aspect);

        let mut scene = Scene::new();
        scene.background = Color::from_hex(config.background);

        let grid = &config.grid;
        let cube = Arc::new(Mesh::rounded_box(
            grid.cube_size,
            grid.cube_size,
            grid.cube_size,
            grid.segments,
            grid.radius,
        )?);
        let layout = GridLayout::for_mesh(
            grid.rows,
            grid.columns,
            &cube,
            grid.gap,
            Point3::from(grid.center),
        )?;

        let lit_cells = if config.instanced {
            scene.add_instanced(create_instanced_cubes(&layout, cube, Material::glass()));
            Vec::new()
        } else {
            let mut cubes = create_cubes(&layout, cube, Material::glass());
            let text = &config.text;
            let lit_cells = text_cell_indexes(
                layout.rows,
                layout.columns,
                &text.text,
                font,
                (text.origin[0], text.origin[1]),
                text.letter_spacing,
            )?;
            light_up(&mut cubes, &lit_cells, config)?;
            for cube in cubes {
                scene.add(cube);
            }
            lit_cells
        };

        let light_config = &config.light;
        let mut light = DirectionalLight::new(Color::from_hex(light_config.color), light_config.intensity);
        light.position = Point3::from(light_config.position);
        scene.add_light(light);

        let controls = config.controls.enabled.then(|| {
            let mut controls = OrbitControls::new(&camera);
            controls.min_zoom = config.controls.min_zoom;
            controls.max_zoom = config.controls.max_zoom;
            controls.enable_damping = config.controls.enable_damping;
            controls.damping_factor = config.controls.damping_factor;
            controls
        });

        log::info!(
            "banner built: {}x{} grid, {} lit cells, instanced={}, controls={}",
            layout.rows,
            layout.columns,
            lit_cells.len(),
            config.instanced,
            controls.is_some()
        );

        Ok(Self {
            scene,
            camera,
            controls,
            lit_cells,
            needs_redraw: true,
            last_stats: RenderStats::default(),
        })
    }

    /// Grid indexes of the raised cubes spelling the text.
    pub fn lit_cells(&self) -> &[usize] {
        &self.lit_cells
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Force the next [`Banner::frame`] to redraw.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Change the output size. The frustum keeps its original shape, so the
    /// image stretches to fit.
    pub fn resize(&mut self, fb: &mut Framebuffer, width: u32, height: u32) {
        fb.resize(width, height);
        self.needs_redraw = true;
    }

    /// One tick of the render loop: update the controls, then redraw if the
    /// view changed. Returns whether `fb` was redrawn.
    pub fn frame(&mut self, fb: &mut Framebuffer) -> bool {
        if let Some(controls) = self.controls.as_mut() {
            if controls.update(&mut self.camera) {
                self.needs_redraw = true;
            }
        }
        if !self.needs_redraw {
            return false;
        }
        self.last_stats = Rasterizer::render(&self.scene, &self.camera, fb);
        self.needs_redraw = false;
        true
    }
}

fn build_camera(config: &BannerConfig, aspect: f32) -> OrthographicCamera {
    let c = &config.camera;
    let mut camera = OrthographicCamera::banner(aspect, c.half_width, c.half_height, c.near, c.far);
    camera.set_rotation(&Euler::from_degrees(c.rotation[0], c.rotation[1], c.rotation[2]));
    camera.position = Point3::from(c.position);
    camera.zoom = c.zoom;
    camera
}

/// Raise the cubes under the text and attach the colored plates to them.
fn light_up(cubes: &mut [Node], lit_cells: &[usize], config: &BannerConfig) -> Result<()> {
    let text = &config.text;
    let plate = Arc::new(Mesh::rounded_box(
        text.plate_size,
        text.plate_size,
        text.plate_depth,
        config.grid.segments,
        text.plate_radius,
    )?);
    let top = Material::basic(text.top_color);
    let bottom = Material::basic(text.bottom_color);
    let offset = text.plate_size / 2.0 - text.plate_depth;

    for &index in lit_cells {
        let cube = cubes.get_mut(index).ok_or_else(|| {
            BannerError::InvalidGrid(format!("lit cell {index} is not part of the grid"))
        })?;
        cube.transform.position += Vector3::new(0.0, text.lift, 0.0);
        if text.material == LitMaterial::Normal {
            cube.material = Material::Normal;
        }

        let mut top_plate = Node::new(plate.clone(), top);
        top_plate.transform.position.z = offset;
        let mut bottom_plate = Node::new(plate.clone(), bottom);
        bottom_plate.transform.position.z = -offset;
        cube.add(top_plate);
        cube.add(bottom_plate);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BannerConfig {
        let mut config = BannerConfig::default();
        config.grid.rows = 30;
        config.grid.columns = 34;
        config.grid.segments = 1;
        config
    }

    #[test]
    fn test_builds_grid_with_lit_cells() {
        let banner = Banner::new(&small_config(), 160, 40).unwrap();
        assert_eq!(banner.scene.nodes.len(), 30 * 34);
        assert_eq!(banner.lit_cells().len(), 32);
        assert_eq!(banner.scene.lights.len(), 1);

        let lit = &banner.scene.nodes[banner.lit_cells()[0]];
        assert_eq!(lit.children.len(), 2);
        assert!((lit.children[0].transform.position.z - 43.0).abs() < 1e-4);
        assert!((lit.children[1].transform.position.z + 43.0).abs() < 1e-4);

        let plain = &banner.scene.nodes[0];
        assert!(plain.children.is_empty());
        assert!((lit.transform.position.y - plain.transform.position.y - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_instanced_banner_has_no_text() {
        let mut config = small_config();
        config.instanced = true;
        let banner = Banner::new(&config, 160, 40).unwrap();
        assert!(banner.scene.nodes.is_empty());
        assert_eq!(banner.scene.instanced.len(), 1);
        assert_eq!(banner.scene.instanced[0].count(), 30 * 34);
        assert!(banner.lit_cells().is_empty());
    }

    #[test]
    fn test_grid_too_small_for_text_is_rejected() {
        let mut config = small_config();
        config.grid.columns = 20;
        assert!(matches!(
            Banner::new(&config, 160, 40),
            Err(BannerError::GlyphOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_camera_follows_config() {
        let mut config = small_config();
        config.controls.enabled = false;
        let banner = Banner::new(&config, 200, 100).unwrap();
        assert!(banner.controls.is_none());
        assert_eq!(banner.camera.left, -1400.0);
        assert_eq!(banner.camera.top, 300.0);
        assert!((banner.camera.position.x + 781.2132).abs() < 1e-3);
    }

    #[test]
    fn test_zero_viewport_is_rejected() {
        assert!(Banner::new(&small_config(), 0, 40).is_err());
    }

    #[test]
    fn test_frame_redraws_only_on_change() {
        let mut banner = Banner::new(&small_config(), 80, 20).unwrap();
        let mut fb = Framebuffer::new(80, 20);
        assert!(banner.frame(&mut fb));
        assert!(!banner.frame(&mut fb));

        if let Some(controls) = banner.controls.as_mut() {
            controls.rotate_left(0.2);
        }
        assert!(banner.frame(&mut fb));
        assert!(!banner.frame(&mut fb));

        banner.request_redraw();
        assert!(banner.frame(&mut fb));
    }

    #[test]
    fn test_normal_material_for_lit_cubes() {
        let mut config = small_config();
        config.text.material = LitMaterial::Normal;
        let banner = Banner::new(&config, 160, 40).unwrap();
        let lit = &banner.scene.nodes[banner.lit_cells()[0]];
        assert_eq!(lit.material, Material::Normal);
        assert_eq!(banner.scene.nodes[0].material, Material::glass());
    }
}
