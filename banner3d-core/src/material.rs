//! Colors, surface materials and directional lights
use std::ops::{Add, Mul};

use nalgebra::{Point3, Vector3};

/// Linear RGB color
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode an sRGB `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Encode to 8-bit sRGB, clamping out-of-range values.
    pub fn to_srgb8(self) -> [u8; 3] {
        let encode = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
        [encode(self.r), encode(self.g), encode(self.b)]
    }

    /// Perceived brightness of the displayed color, in `[0, 1]`.
    pub fn luminance(self) -> f32 {
        let [r, g, b] = self.to_srgb8();
        (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        self * (1.0 - t) + other * t
    }

    pub fn scale(self, factor: f32) -> Color {
        Color::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Color {
        self.scale(rhs)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// A light shining from `position` towards `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Point3::new(0.0, 1.0, 0.0),
            target: Point3::origin(),
        }
    }

    /// Unit vector from the lit surface towards the light
    pub fn direction(&self) -> Vector3<f32> {
        (self.position - self.target)
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::y)
    }

    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Flat color, unaffected by lights
    Basic { color: Color },
    /// Colors a face by its view-space normal
    Normal,
    /// Lit surface; `transmission` makes it see-through like glass
    Physical {
        color: Color,
        metalness: f32,
        roughness: f32,
        transmission: f32,
    },
}

/// What a shaded face contributes to the pixel under it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shade {
    Opaque(Color),
    /// Blended over what lies behind: `dst * transmittance + emitted`
    Transmissive { emitted: Color, transmittance: f32 },
}

/// Geometry needed to shade one flat face
#[derive(Debug, Clone, Copy)]
pub struct Surface {
    pub normal: Vector3<f32>,
    pub view_normal: Vector3<f32>,
    pub view_direction: Vector3<f32>,
}

impl Material {
    pub fn basic(hex: u32) -> Self {
        Material::Basic {
            color: Color::from_hex(hex),
        }
    }

    /// Frosted glass used for the banner cubes
    pub fn glass() -> Self {
        Material::Physical {
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 0.6,
            transmission: 1.0,
        }
    }

    pub fn is_transmissive(&self) -> bool {
        matches!(self, Material::Physical { transmission, .. } if *transmission > 0.0)
    }

    pub fn shade(&self, surface: &Surface, lights: &[DirectionalLight]) -> Shade {
        match *self {
            Material::Basic { color } => Shade::Opaque(color),
            Material::Normal => {
                let n = surface.view_normal * 0.5 + Vector3::new(0.5, 0.5, 0.5);
                Shade::Opaque(Color::new(n.x, n.y, n.z))
            }
            Material::Physical {
                color,
                metalness,
                roughness,
                transmission,
            } => {
                let transmission = transmission.clamp(0.0, 1.0);
                let metalness = metalness.clamp(0.0, 1.0);
                let diffuse_weight = (1.0 - transmission) * (1.0 - metalness);
                let f0 = Color::new(0.04, 0.04, 0.04).lerp(color, metalness);
                let shininess = blinn_phong_exponent(roughness);
                let normalization = (shininess + 8.0) / (8.0 * std::f32::consts::PI);

                let mut emitted = Color::BLACK;
                for light in lights {
                    let l = light.direction();
                    let n_dot_l = surface.normal.dot(&l);
                    if n_dot_l <= 0.0 {
                        continue;
                    }
                    let irradiance = light.radiance() * n_dot_l;
                    let diffuse = color * (diffuse_weight / std::f32::consts::PI);
                    let specular = match (l + surface.view_direction).try_normalize(1e-9) {
                        Some(h) => {
                            f0 * (normalization * surface.normal.dot(&h).max(0.0).powf(shininess))
                        }
                        None => Color::BLACK,
                    };
                    emitted = emitted + (diffuse + specular) * irradiance;
                }

                if transmission > 0.0 {
                    Shade::Transmissive {
                        emitted,
                        transmittance: transmission * (1.0 - metalness),
                    }
                } else {
                    Shade::Opaque(emitted)
                }
            }
        }
    }
}

/// Blinn-Phong exponent approximating a GGX lobe of the given roughness.
fn blinn_phong_exponent(roughness: f32) -> f32 {
    let alpha = roughness.clamp(0.05, 1.0).powi(2);
    (2.0 / (alpha * alpha) - 2.0).max(1.0)
}
