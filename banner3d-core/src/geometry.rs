//! Geometry primitives for the banner meshes
use nalgebra::{Point3, Vector3};

use crate::error::{BannerError, Result};

/// Most curve segments allowed per rounded edge
pub const MAX_SEGMENTS: u32 = 32;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order, `None` for zero-area triangles.
    pub fn calculate_normal(&self) -> Option<Vector3<f32>> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(1e-12)
    }

    pub fn centroid(&self) -> Point3<f32> {
        let sum = self.vertices[0].position.coords
            + self.vertices[1].position.coords
            + self.vertices[2].position.coords;
        Point3::from(sum / 3.0)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// An inverted box that any `extend` call will replace.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    pub fn half_extent(&self) -> Vector3<f32> {
        self.size() / 2.0
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bounds: Aabb,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
            bounds: Aabb::empty(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
            bounds: Aabb::empty(),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        for vertex in &triangle.vertices {
            self.bounds.extend(&vertex.position);
        }
        self.triangles.push(triangle);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of every vertex, maintained as triangles are added.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Create a box with rounded edges and corners, centered at the origin.
    ///
    /// Every axis is split into `2 * segments + 1` intervals: `segments` for each
    /// rounded band and one for the flat middle. Each grid vertex is then pushed
    /// onto the rounded surface around the inner box shrunk by `radius`. The
    /// radius is clamped to half the smallest side.
    pub fn rounded_box(
        width: f32,
        height: f32,
        depth: f32,
        segments: u32,
        radius: f32,
    ) -> Result<Self> {
        if !(width > 0.0 && height > 0.0 && depth > 0.0) {
            return Err(BannerError::InvalidGeometry(format!(
                "box dimensions must be positive, got {width}x{height}x{depth}"
            )));
        }
        if !(radius >= 0.0) {
            return Err(BannerError::InvalidGeometry(format!(
                "box radius must not be negative, got {radius}"
            )));
        }
        if segments > MAX_SEGMENTS {
            return Err(BannerError::InvalidGeometry(format!(
                "{segments} edge segments is more than {MAX_SEGMENTS}"
            )));
        }

        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        let radius = radius.min(half.min());
        let rounded = radius > 1e-6 && segments > 0;
        let inner = if rounded {
            half.add_scalar(-radius)
        } else {
            half
        };

        let coords = [
            axis_coordinates(half.x, radius, segments, rounded),
            axis_coordinates(half.y, radius, segments, rounded),
            axis_coordinates(half.z, radius, segments, rounded),
        ];

        // (normal axis, u axis, v axis, sign) with u x v pointing along the normal
        const FACES: [(usize, usize, usize, f32); 6] = [
            (0, 1, 2, 1.0),
            (0, 2, 1, -1.0),
            (1, 2, 0, 1.0),
            (1, 0, 2, -1.0),
            (2, 0, 1, 1.0),
            (2, 1, 0, -1.0),
        ];

        let per_face = (coords[0].len().max(coords[1].len()).max(coords[2].len())).pow(2) * 2;
        let mut mesh = Self::with_capacity(per_face * FACES.len());

        for (axis, u_axis, v_axis, sign) in FACES {
            let us = &coords[u_axis];
            let vs = &coords[v_axis];
            let vertex_at = |i: usize, j: usize| {
                let mut p = Vector3::zeros();
                p[axis] = sign * half[axis];
                p[u_axis] = us[i];
                p[v_axis] = vs[j];
                let mut face_normal = Vector3::zeros();
                face_normal[axis] = sign;
                project_to_rounded(p, inner, radius, face_normal, rounded)
            };

            for i in 0..us.len() - 1 {
                for j in 0..vs.len() - 1 {
                    let a = vertex_at(i, j);
                    let b = vertex_at(i + 1, j);
                    let c = vertex_at(i + 1, j + 1);
                    let d = vertex_at(i, j + 1);
                    mesh.add_triangle(Triangle::new(a, b, c));
                    mesh.add_triangle(Triangle::new(a, c, d));
                }
            }
        }

        Ok(mesh)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Grid coordinates along one axis, from `-half` to `half`.
fn axis_coordinates(half: f32, radius: f32, segments: u32, rounded: bool) -> Vec<f32> {
    if !rounded {
        return vec![-half, half];
    }

    let inner = half - radius;
    let band: Vec<f32> = (0..=segments)
        .map(|k| {
            let theta = std::f32::consts::FRAC_PI_2 * k as f32 / segments as f32;
            inner + radius * theta.sin()
        })
        .collect();

    let mut coords: Vec<f32> = band.iter().rev().map(|c| -c).collect();
    coords.extend(band);
    coords
}

fn project_to_rounded(
    p: Vector3<f32>,
    inner: Vector3<f32>,
    radius: f32,
    face_normal: Vector3<f32>,
    rounded: bool,
) -> Vertex {
    if !rounded {
        return Vertex::new(Point3::from(p), face_normal);
    }

    let clamped = Vector3::new(
        p.x.clamp(-inner.x, inner.x),
        p.y.clamp(-inner.y, inner.y),
        p.z.clamp(-inner.z, inner.z),
    );
    let normal = (p - clamped).try_normalize(1e-9).unwrap_or(face_normal);
    Vertex::new(Point3::from(clamped + normal * radius), normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_box_bounds_match_dimensions() {
        let mesh = Mesh::rounded_box(100.0, 100.0, 100.0, 6, 6.0).unwrap();
        let size = mesh.bounds().size();
        assert!((size.x - 100.0).abs() < 1e-3);
        assert!((size.y - 100.0).abs() < 1e-3);
        assert!((size.z - 100.0).abs() < 1e-3);
        assert!(mesh.bounds().center().coords.norm() < 1e-3);
    }

    #[test]
    fn test_rounded_box_triangle_count() {
        let mesh = Mesh::rounded_box(100.0, 100.0, 100.0, 6, 6.0).unwrap();
        // 13 intervals per axis, two triangles per quad, six faces
        assert_eq!(mesh.len(), 13 * 13 * 2 * 6);
    }

    #[test]
    fn test_rounded_box_winds_outward() {
        let mesh = Mesh::rounded_box(100.0, 60.0, 20.0, 3, 6.0).unwrap();
        let mut checked = 0;
        for triangle in mesh.triangles() {
            if let Some(normal) = triangle.calculate_normal() {
                assert!(normal.dot(&triangle.centroid().coords) > 0.0);
                checked += 1;
            }
        }
        assert!(checked > mesh.len() / 2);
    }

    #[test]
    fn test_radius_is_clamped_to_thinnest_side() {
        // depth 5 limits the radius to 2.5
        let mesh = Mesh::rounded_box(96.0, 96.0, 5.0, 6, 6.0).unwrap();
        let size = mesh.bounds().size();
        assert!((size.z - 5.0).abs() < 1e-3);
        assert!((size.x - 96.0).abs() < 1e-3);
        for triangle in mesh.triangles() {
            for vertex in &triangle.vertices {
                assert!(vertex.position.z.abs() <= 2.5 + 1e-3);
            }
        }
    }

    #[test]
    fn test_zero_radius_is_plain_box() {
        let mesh = Mesh::rounded_box(2.0, 2.0, 2.0, 6, 0.0).unwrap();
        assert_eq!(mesh.len(), 12);
    }

    #[test]
    fn test_rejects_non_positive_dimensions() {
        assert!(Mesh::rounded_box(0.0, 1.0, 1.0, 2, 0.1).is_err());
        assert!(Mesh::rounded_box(1.0, 1.0, 1.0, 2, -0.1).is_err());
    }

    #[test]
    fn test_rejects_too_many_segments() {
        assert!(Mesh::rounded_box(1.0, 1.0, 1.0, MAX_SEGMENTS, 0.1).is_ok());
        assert!(matches!(
            Mesh::rounded_box(1.0, 1.0, 1.0, MAX_SEGMENTS + 1, 0.1),
            Err(BannerError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_empty_bounds() {
        let mesh = Mesh::new();
        assert!(mesh.bounds().is_empty());
        assert_eq!(mesh.bounds().size(), Vector3::zeros());
    }
}
