//! ASCII output for the banner framebuffer
use banner3d_core::Framebuffer;
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Below this luminance a colored glyph would be unreadable
const DIM_LUMINANCE: f32 = 0.08;

/// Converts a rendered framebuffer into colored terminal characters
pub struct AsciiRenderer {
    top_row: u16,
}

impl AsciiRenderer {
    /// `top_row` is the first terminal row the image is drawn on.
    pub fn new(top_row: u16) -> Self {
        Self { top_row }
    }

    /// Character and color for one pixel. Uncovered pixels stay blank and
    /// covered ones always get at least a dot.
    pub fn cell(fb: &Framebuffer, x: u32, y: u32) -> (char, Color) {
        if !fb.is_covered(x, y) {
            return (' ', Color::Reset);
        }

        let pixel = fb.pixel(x, y);
        let luminance = pixel.luminance();
        let char_index = (luminance * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);

        let color = if luminance < DIM_LUMINANCE {
            Color::DarkGrey
        } else {
            let [r, g, b] = pixel.to_srgb8();
            Color::Rgb { r, g, b }
        };
        (LUMINOSITY_RAMP[char_index], color)
    }

    pub fn draw<W: Write>(&self, fb: &Framebuffer, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<Color> = None;
        for y in 0..fb.height() {
            writer.queue(cursor::MoveTo(0, self.top_row.saturating_add(y as u16)))?;
            for x in 0..fb.width() {
                let (c, color) = Self::cell(fb, x, y);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banner3d_core::nalgebra::Point3;
    use banner3d_core::{Framebuffer, Material, Mesh, Node, OrthographicCamera, Rasterizer, Scene};
    use std::sync::Arc;

    #[test]
    fn test_background_is_blank() {
        let fb = Framebuffer::new(2, 2);
        assert_eq!(AsciiRenderer::cell(&fb, 0, 0), (' ', Color::Reset));
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let fb = Framebuffer::new(3, 2);
        let mut out = Vec::new();
        AsciiRenderer::new(1).draw(&fb, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(' ').count(), 6);
    }

    #[test]
    fn test_bright_faces_use_the_top_of_the_ramp() {
        let mut scene = Scene::new();
        let mesh = Arc::new(Mesh::rounded_box(4.0, 4.0, 4.0, 1, 0.0).unwrap());
        scene.add(Node::new(mesh, Material::basic(0xffffff)));
        let mut camera = OrthographicCamera::new(-10.0, 10.0, 10.0, -10.0, 0.1, 100.0);
        camera.position = Point3::new(0.0, 0.0, 50.0);
        camera.look_at(&Point3::origin());

        let mut fb = Framebuffer::new(20, 20);
        Rasterizer::render(&scene, &camera, &mut fb);
        assert_eq!(
            AsciiRenderer::cell(&fb, 10, 10),
            ('@', Color::Rgb { r: 255, g: 255, b: 255 })
        );
    }
}
