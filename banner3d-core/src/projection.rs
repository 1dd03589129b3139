//! Orthographic camera used to frame the banner
use nalgebra::{Isometry3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};

use crate::transform::Euler;

/// Orthographic camera. Looks down its local -Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub up: Vector3<f32>,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
            zoom: 1.0,
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            up: Vector3::y(),
        }
    }

    /// Banner frustum. Both extents scale with the aspect ratio, so the image
    /// is only undistorted at one viewport shape.
    pub fn banner(aspect: f32, half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        Self::new(
            -half_width * aspect,
            half_width * aspect,
            half_height * aspect,
            -half_height * aspect,
            near,
            far,
        )
    }

    pub fn set_rotation(&mut self, rotation: &Euler) {
        self.rotation = rotation.to_quaternion();
    }

    /// Orient the camera so that -Z points at `target`.
    pub fn look_at(&mut self, target: &Point3<f32>) {
        let backward = self.position - target;
        if backward.norm_squared() < 1e-12 {
            return;
        }
        self.rotation = UnitQuaternion::face_towards(&backward, &self.up);
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.isometry().to_homogeneous()
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.isometry().inverse().to_homogeneous()
    }

    /// Create the projection matrix, with zoom applied around the frustum center
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let (left, right, top, bottom) = self.zoomed_extents();
        Matrix4::new_orthographic(left, right, bottom, top, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point to screen space: `(x, y, ndc depth)`.
    ///
    /// Points outside the near/far range yield `None`. Points beyond the
    /// left/right/top/bottom planes are still returned so callers can clip.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let ndc = self.view_projection().transform_point(point);
        ndc_to_screen(&ndc, width, height)
    }

    /// Screen pixels per world unit along x and y.
    pub fn pixels_per_unit(&self, width: u32, height: u32) -> (f32, f32) {
        let (left, right, top, bottom) = self.zoomed_extents();
        (
            width as f32 / (right - left),
            height as f32 / (top - bottom),
        )
    }

    /// Camera-space +X in world coordinates
    pub fn right_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::x()
    }

    /// Camera-space +Y in world coordinates
    pub fn up_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// Direction from the scene towards the camera
    pub fn view_direction(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    fn isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    fn zoomed_extents(&self) -> (f32, f32, f32, f32) {
        let dx = (self.right - self.left) / (2.0 * self.zoom);
        let dy = (self.top - self.bottom) / (2.0 * self.zoom);
        let cx = (self.right + self.left) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;
        (cx - dx, cx + dx, cy + dy, cy - dy)
    }
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self::new(-1.0, 1.0, 1.0, -1.0, 0.1, 100.0)
    }
}

/// Convert a normalized device coordinate to screen space.
pub fn ndc_to_screen(ndc: &Point3<f32>, width: u32, height: u32) -> Option<(f32, f32, f32)> {
    if !ndc.z.is_finite() || ndc.z < -1.0 || ndc.z > 1.0 {
        return None;
    }
    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;
    Some((screen_x, screen_y, ndc.z))
}
