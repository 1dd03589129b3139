//! Orbit controls for the orthographic camera
//!
//! The camera orbits `target` on a sphere. Input methods only accumulate
//! deltas; [`OrbitControls::update`] applies them to the camera once per frame.
use std::f32::consts::PI;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::projection::OrthographicCamera;

const EPS: f32 = 1e-6;
// f32 quaternion dot products carry ~1e-7 of rounding noise
const ROTATION_EPS: f32 = 1e-5;

/// Spherical coordinates, y-up: `phi` is the polar angle from +Y, `theta` the
/// azimuth around Y measured from +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_vector(v: &Vector3<f32>) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep `phi` away from the poles, where the up vector degenerates.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Debug, Clone, Copy)]
struct SavedState {
    target: Point3<f32>,
    position: Point3<f32>,
    zoom: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Point3<f32>,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_azimuth_angle: f32,
    pub max_azimuth_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    spherical_delta: Spherical,
    pan_offset: Vector3<f32>,
    zoom_changed: bool,
    last_position: Point3<f32>,
    last_rotation: UnitQuaternion<f32>,
    saved: SavedState,
}

impl OrbitControls {
    pub fn new(camera: &OrthographicCamera) -> Self {
        Self {
            enabled: true,
            target: Point3::origin(),
            min_zoom: 0.0,
            max_zoom: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_azimuth_angle: f32::NEG_INFINITY,
            max_azimuth_angle: f32::INFINITY,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            spherical_delta: Spherical::default(),
            pan_offset: Vector3::zeros(),
            zoom_changed: false,
            // Forces the first update to report a change
            last_position: Point3::new(f32::NAN, f32::NAN, f32::NAN),
            last_rotation: UnitQuaternion::identity(),
            saved: SavedState {
                target: Point3::origin(),
                position: camera.position,
                zoom: camera.zoom,
            },
        }
    }

    /// Remember the current view for [`OrbitControls::reset`].
    pub fn save_state(&mut self, camera: &OrthographicCamera) {
        self.saved = SavedState {
            target: self.target,
            position: camera.position,
            zoom: camera.zoom,
        };
    }

    /// Restore the last saved view and drop pending input.
    pub fn reset(&mut self, camera: &mut OrthographicCamera) {
        self.target = self.saved.target;
        camera.position = self.saved.position;
        camera.zoom = self.saved.zoom;
        self.spherical_delta = Spherical::default();
        self.pan_offset = Vector3::zeros();
        self.zoom_changed = true;
        self.update(camera);
    }

    pub fn rotate_left(&mut self, angle: f32) {
        if self.enabled {
            self.spherical_delta.theta -= angle;
        }
    }

    pub fn rotate_up(&mut self, angle: f32) {
        if self.enabled {
            self.spherical_delta.phi -= angle;
        }
    }

    /// Orbit by a pointer drag measured in pixels.
    pub fn rotate_drag(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    /// Pan by a pointer drag measured in pixels, in the camera's screen plane.
    pub fn pan_drag(
        &mut self,
        dx: f32,
        dy: f32,
        camera: &OrthographicCamera,
        width: u32,
        height: u32,
    ) {
        if !self.enabled {
            return;
        }
        let left = dx * (camera.right - camera.left) / camera.zoom / width.max(1) as f32;
        let up = dy * (camera.top - camera.bottom) / camera.zoom / height.max(1) as f32;
        self.pan_offset -= camera.right_axis() * left * self.pan_speed;
        self.pan_offset += camera.up_axis() * up * self.pan_speed;
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    pub fn dolly_in(&mut self, camera: &mut OrthographicCamera, scale: f32) {
        self.set_zoom(camera, camera.zoom / scale);
    }

    pub fn dolly_out(&mut self, camera: &mut OrthographicCamera, scale: f32) {
        self.set_zoom(camera, camera.zoom * scale);
    }

    /// Wheel input: negative deltas zoom in.
    pub fn zoom_wheel(&mut self, camera: &mut OrthographicCamera, delta_y: f32) {
        let scale = self.zoom_scale();
        if delta_y < 0.0 {
            self.dolly_in(camera, scale);
        } else if delta_y > 0.0 {
            self.dolly_out(camera, scale);
        }
    }

    fn set_zoom(&mut self, camera: &mut OrthographicCamera, zoom: f32) {
        if !self.enabled {
            return;
        }
        camera.zoom = zoom.clamp(self.min_zoom.max(EPS), self.max_zoom);
        self.zoom_changed = true;
    }

    /// Apply pending input to the camera. Returns whether the view changed.
    pub fn update(&mut self, camera: &mut OrthographicCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_vector(&offset);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        if self.min_azimuth_angle.is_finite() && self.max_azimuth_angle.is_finite() {
            spherical.theta = clamp_azimuth(
                spherical.theta,
                self.min_azimuth_angle,
                self.max_azimuth_angle,
            );
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_vector();
        camera.look_at(&self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= keep;
            self.spherical_delta.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::zeros();
        }

        let moved = !((camera.position - self.last_position).norm_squared() <= EPS);
        let turned = 8.0 * (1.0 - self.last_rotation.coords.dot(&camera.rotation.coords)) > ROTATION_EPS;
        let changed = self.zoom_changed || moved || turned;
        if changed {
            self.last_position = camera.position;
            self.last_rotation = camera.rotation;
            self.zoom_changed = false;
        }
        changed
    }
}

/// Clamp an azimuth to `[min, max]`, taking the shorter way around.
fn clamp_azimuth(theta: f32, min: f32, max: f32) -> f32 {
    let two_pi = 2.0 * PI;
    let wrap = |a: f32| {
        if a < -PI {
            a + two_pi
        } else if a > PI {
            a - two_pi
        } else {
            a
        }
    };
    let (min, max) = (wrap(min), wrap(max));
    if min <= max {
        theta.clamp(min, max)
    } else if theta > (min + max) / 2.0 {
        theta.max(min)
    } else {
        theta.min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Point3<f32>) -> OrthographicCamera {
        let mut camera = OrthographicCamera::banner(2.0, 700.0, 150.0, -100000.0, 100000.0);
        camera.position = position;
        camera
    }

    #[test]
    fn test_spherical_round_trip() {
        let v = Vector3::new(-781.2, 681.9, 496.6);
        let back = Spherical::from_vector(&v).to_vector();
        assert!((back - v).norm() < 1e-2);
    }

    #[test]
    fn test_first_update_aims_at_target() {
        let mut camera = camera_at(Point3::new(-781.2, 681.9, 496.6));
        let mut controls = OrbitControls::new(&camera);
        assert!(controls.update(&mut camera));
        let forward = camera.rotation * -Vector3::z();
        let expected = (Point3::origin() - camera.position).normalize();
        assert!((forward - expected).norm() < 1e-4);
        // Nothing pending: the next frame is unchanged
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_rotate_left_keeps_distance() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.update(&mut camera);
        controls.rotate_left(PI / 2.0);
        assert!(controls.update(&mut camera));
        assert!((camera.position.coords.norm() - 100.0).abs() < 1e-3);
        assert!((camera.position.x + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_polar_angle_stays_off_the_pole() {
        let mut camera = camera_at(Point3::new(0.0, 50.0, 50.0));
        let mut controls = OrbitControls::new(&camera);
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        assert!(camera.position.y < 100.0);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.max_zoom = 1.5;
        for _ in 0..50 {
            controls.zoom_wheel(&mut camera, -1.0);
        }
        assert!((camera.zoom - 1.5).abs() < 1e-6);
        controls.zoom_wheel(&mut camera, 1.0);
        assert!(camera.zoom < 1.5);
        controls.update(&mut camera);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_pan_moves_target_and_camera_together() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.update(&mut camera);
        let before = camera.position - controls.target;
        controls.pan_drag(100.0, 0.0, &camera, 800, 400);
        controls.update(&mut camera);
        assert!(controls.target.x < 0.0);
        assert!(((camera.position - controls.target) - before).norm() < 1e-3);
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.enabled = false;
        controls.rotate_left(1.0);
        controls.zoom_wheel(&mut camera, -1.0);
        controls.update(&mut camera);
        assert!((camera.position - Point3::new(0.0, 0.0, 100.0)).norm() < 1e-3);
        assert_eq!(camera.zoom, 1.0);
    }

    #[test]
    fn test_reset_restores_saved_view() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.update(&mut camera);
        controls.save_state(&camera);
        controls.rotate_left(1.0);
        controls.zoom_wheel(&mut camera, -1.0);
        controls.update(&mut camera);
        controls.reset(&mut camera);
        assert!((camera.position - Point3::new(0.0, 0.0, 100.0)).norm() < 1e-3);
        assert_eq!(camera.zoom, 1.0);
    }

    #[test]
    fn test_damping_spreads_input_over_frames() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.enable_damping = true;
        controls.update(&mut camera);

        controls.rotate_left(0.5);
        controls.pan_drag(30.0, 10.0, &camera, 800, 400);
        // 105 world units right and 15 up for this frustum
        let pan_distance = (105.0f32 * 105.0 + 15.0 * 15.0).sqrt();

        assert!(controls.update(&mut camera));
        let offset = camera.position - controls.target;
        let theta = offset.x.atan2(offset.z);
        assert!((theta + 0.5 * controls.damping_factor).abs() < 1e-4);
        assert!(controls.target.coords.norm() < pan_distance * 0.1);

        let mut frames = 1;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 1000, "damped controls never settled");
        }
        assert!(frames > 10);

        let offset = camera.position - controls.target;
        assert!((offset.x.atan2(offset.z) + 0.5).abs() < 1e-2);
        assert!((controls.target.coords.norm() - pan_distance).abs() < 1.0);
        assert!((offset.norm() - 100.0).abs() < 1e-2);
    }

    #[test]
    fn test_azimuth_limits() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 100.0));
        let mut controls = OrbitControls::new(&camera);
        controls.min_azimuth_angle = -0.5;
        controls.max_azimuth_angle = 0.5;
        controls.rotate_left(-2.0);
        controls.update(&mut camera);
        let theta = camera.position.x.atan2(camera.position.z);
        assert!((theta - 0.5).abs() < 1e-4);
    }
}
