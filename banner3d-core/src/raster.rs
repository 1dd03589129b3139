//! Software rasterizer drawing a scene into a color + depth framebuffer
//!
//! Opaque faces are drawn first and write depth. Transmissive faces are drawn
//! afterwards against that depth without writing it, blending over whatever
//! is behind them, so the text plates show through the glass cubes.
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

use crate::material::{Color, Shade, Surface};
use crate::projection::{ndc_to_screen, OrthographicCamera};
use crate::scene::{DrawItem, Scene};

/// Color and depth per pixel, row-major from the top-left corner
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Color>,
    depth: Vec<f32>,
    covered: Vec<bool>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Color::BLACK; size],
            depth: vec![f32::INFINITY; size],
            covered: vec![false; size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self, background: Color) {
        self.color.fill(background);
        self.depth.fill(f32::INFINITY);
        self.covered.fill(false);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.color[self.index(x, y)]
    }

    /// Whether any face was drawn over the background at this pixel.
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.covered[self.index(x, y)]
    }

    /// Encode to sRGB RGBA bytes, replacing the contents of `out`.
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.color.len() * 4);
        for color in &self.color {
            let [r, g, b] = color.to_srgb8();
            out.extend_from_slice(&[r, g, b, 255]);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// What the last render did, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub items: usize,
    pub culled_items: usize,
    pub triangles: usize,
}

pub struct Rasterizer {
    view_projection: Matrix4<f32>,
    view_direction: Vector3<f32>,
    view_rotation: UnitQuaternion<f32>,
    pixels_per_unit: f32,
    width: u32,
    height: u32,
}

impl Rasterizer {
    /// Draw `scene` as seen from `camera`, replacing the framebuffer contents.
    pub fn render(scene: &Scene, camera: &OrthographicCamera, fb: &mut Framebuffer) -> RenderStats {
        fb.clear(scene.background);
        let mut stats = RenderStats::default();
        if fb.width == 0 || fb.height == 0 {
            return stats;
        }

        let (ppu_x, ppu_y) = camera.pixels_per_unit(fb.width, fb.height);
        let rasterizer = Self {
            view_projection: camera.view_projection(),
            view_direction: camera.view_direction(),
            view_rotation: camera.rotation.inverse(),
            pixels_per_unit: ppu_x.abs().max(ppu_y.abs()),
            width: fb.width,
            height: fb.height,
        };

        let items = scene.draw_items();
        stats.items = items.len();

        let mut transmissive = Vec::new();
        for item in &items {
            if !rasterizer.is_visible(item) {
                stats.culled_items += 1;
                continue;
            }
            if item.material.is_transmissive() {
                transmissive.push(item);
            } else {
                stats.triangles += rasterizer.draw_item(item, scene, fb);
            }
        }
        for item in transmissive {
            stats.triangles += rasterizer.draw_item(item, scene, fb);
        }

        log::trace!(
            "rendered {} items ({} culled), {} triangles",
            stats.items,
            stats.culled_items,
            stats.triangles
        );
        stats
    }

    /// Cull items whose bounding sphere lands entirely off screen.
    fn is_visible(&self, item: &DrawItem<'_>) -> bool {
        let bounds = item.mesh.bounds();
        if bounds.is_empty() {
            return false;
        }
        let center = item.model.transform_point(&bounds.center());
        let radius = bounds.half_extent().norm() * max_scale(&item.model) * self.pixels_per_unit;
        let ndc = self.view_projection.transform_point(&center);
        let x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        x + radius >= 0.0
            && x - radius <= self.width as f32
            && y + radius >= 0.0
            && y - radius <= self.height as f32
    }

    fn draw_item(&self, item: &DrawItem<'_>, scene: &Scene, fb: &mut Framebuffer) -> usize {
        let mut drawn = 0;

        for triangle in item.mesh.triangles() {
            let world = triangle
                .vertices
                .map(|vertex| item.model.transform_point(&vertex.position));

            let Some(normal) = (world[1] - world[0])
                .cross(&(world[2] - world[0]))
                .try_normalize(1e-12)
            else {
                continue;
            };
            if normal.dot(&self.view_direction) <= 0.0 {
                continue;
            }

            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut clipped = false;
            for (slot, point) in screen.iter_mut().zip(&world) {
                match self.project(point) {
                    Some(projected) => *slot = projected,
                    None => clipped = true,
                }
            }
            if clipped {
                continue;
            }

            let surface = Surface {
                normal,
                view_normal: self.view_rotation * normal,
                view_direction: self.view_direction,
            };
            let shade = item.material.shade(&surface, &scene.lights);
            if rasterize_triangle(fb, &screen, shade) {
                drawn += 1;
            }
        }

        drawn
    }

    fn project(&self, point: &Point3<f32>) -> Option<(f32, f32, f32)> {
        let ndc = self.view_projection.transform_point(point);
        ndc_to_screen(&ndc, self.width, self.height)
    }
}

fn max_scale(model: &Matrix4<f32>) -> f32 {
    (0..3)
        .map(|column| model.fixed_view::<3, 1>(0, column).norm())
        .fold(0.0, f32::max)
}

/// Fill the pixels whose centers fall inside the triangle. Returns whether the
/// triangle overlapped the framebuffer at all.
fn rasterize_triangle(fb: &mut Framebuffer, coords: &[(f32, f32, f32); 3], shade: Shade) -> bool {
    let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

    // Bounding box
    let min_x = v0.0.min(v1.0).min(v2.0).floor() as i64;
    let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i64;
    let min_y = v0.1.min(v1.1).min(v2.1).floor() as i64;
    let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i64;

    // Clip to screen bounds
    let min_x = min_x.max(0);
    let max_x = max_x.min(fb.width as i64 - 1);
    let min_y = min_y.max(0);
    let max_y = max_y.min(fb.height as i64 - 1);
    if min_x > max_x || min_y > max_y {
        return false;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let Some((w0, w1, w2)) =
                barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
            else {
                return false;
            };
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
            let idx = y as usize * fb.width as usize + x as usize;
            if depth >= fb.depth[idx] {
                continue;
            }
            match shade {
                Shade::Opaque(color) => {
                    fb.depth[idx] = depth;
                    fb.color[idx] = color;
                }
                Shade::Transmissive {
                    emitted,
                    transmittance,
                } => {
                    fb.color[idx] = fb.color[idx] * transmittance + emitted;
                }
            }
            fb.covered[idx] = true;
        }
    }
    true
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::material::{DirectionalLight, Material};
    use crate::scene::Node;
    use std::sync::Arc;

    fn front_camera() -> OrthographicCamera {
        let mut camera = OrthographicCamera::new(-10.0, 10.0, 10.0, -10.0, 0.1, 100.0);
        camera.position = Point3::new(0.0, 0.0, 50.0);
        camera.look_at(&Point3::origin());
        camera
    }

    fn box_node(size: f32, material: Material) -> Node {
        Node::new(
            Arc::new(Mesh::rounded_box(size, size, size, 1, 0.0).unwrap()),
            material,
        )
    }

    #[test]
    fn test_opaque_box_covers_center_only() {
        let mut scene = Scene::new();
        scene.add(box_node(4.0, Material::basic(0x2dc26b)));
        let mut fb = Framebuffer::new(20, 20);
        let stats = Rasterizer::render(&scene, &front_camera(), &mut fb);

        assert_eq!(stats.items, 1);
        // Only the front face survives back-face culling
        assert_eq!(stats.triangles, 2);
        assert!(fb.is_covered(10, 10));
        assert_eq!(fb.pixel(10, 10).to_srgb8(), [0x2d, 0xc2, 0x6b]);
        assert!(!fb.is_covered(1, 1));
        assert_eq!(fb.pixel(1, 1), Color::BLACK);
    }

    #[test]
    fn test_nearer_face_wins_depth_test() {
        let mut scene = Scene::new();
        let mut near = box_node(2.0, Material::basic(0xff0000));
        near.transform.position = Vector3::new(0.0, 0.0, 5.0);
        // Added after the near box so draw order cannot decide the result
        let far = box_node(8.0, Material::basic(0x0000ff));
        scene.add(near);
        scene.add(far);
        let mut fb = Framebuffer::new(20, 20);
        Rasterizer::render(&scene, &front_camera(), &mut fb);
        assert_eq!(fb.pixel(10, 10).to_srgb8(), [0xff, 0, 0]);
        assert_eq!(fb.pixel(7, 10).to_srgb8(), [0, 0, 0xff]);
    }

    #[test]
    fn test_opaque_faces_show_through_glass() {
        let mut scene = Scene::new();
        let mut light = DirectionalLight::new(Color::WHITE, 1.0);
        light.position = Point3::new(0.0, 0.0, 10.0);
        scene.add_light(light);
        let mut glass = box_node(8.0, Material::glass());
        glass.add(box_node(2.0, Material::basic(0xffffff)));
        scene.add(glass);

        let mut fb = Framebuffer::new(20, 20);
        Rasterizer::render(&scene, &front_camera(), &mut fb);
        // The plate inside stays visible, brightened by the glass highlight
        assert!(fb.pixel(10, 10).r >= 1.0);
        // Off the plate the glass only adds its highlight over the background
        assert!(fb.is_covered(6, 10));
        assert!(fb.pixel(6, 10).r > 0.0);
        assert!(fb.pixel(6, 10).r < 1.0);
    }

    #[test]
    fn test_offscreen_items_are_culled() {
        let mut scene = Scene::new();
        let mut node = box_node(2.0, Material::Normal);
        node.transform.position = Vector3::new(500.0, 0.0, 0.0);
        scene.add(node);
        let mut fb = Framebuffer::new(20, 20);
        let stats = Rasterizer::render(&scene, &front_camera(), &mut fb);
        assert_eq!(stats.culled_items, 1);
        assert_eq!(stats.triangles, 0);
    }

    #[test]
    fn test_empty_framebuffer_draws_nothing() {
        let mut scene = Scene::new();
        scene.add(box_node(2.0, Material::Normal));
        let mut fb = Framebuffer::new(0, 0);
        let stats = Rasterizer::render(&scene, &front_camera(), &mut fb);
        assert_eq!(stats, RenderStats::default());
    }

    #[test]
    fn test_rgba_output() {
        let mut fb = Framebuffer::new(2, 1);
        fb.clear(Color::from_hex(0x5784da));
        let mut out = Vec::new();
        fb.write_rgba8(&mut out);
        assert_eq!(out, vec![0x57, 0x84, 0xda, 255, 0x57, 0x84, 0xda, 255]);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }
}
