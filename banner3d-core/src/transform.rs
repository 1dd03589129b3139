//! 3D transformation matrices and Euler rotations
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

/// Rotation around three axes (in radians), applied in `XYZ` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn from_degrees(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x.to_radians(),
            y: y.to_radians(),
            z: z.to_radians(),
        }
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.x)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.y)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.z)
    }
}

impl Default for Euler {
    fn default() -> Self {
        Self::zero()
    }
}

/// Position, rotation and scale of a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Euler,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Euler::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position: position.coords,
            ..Self::identity()
        }
    }

    /// Local matrix, `T * R * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Self::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Self::rotation_matrix(&self.rotation)
            * Self::scale_matrix(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Create a rotation matrix from Euler angles
    pub fn rotation_matrix(rotation: &Euler) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // XYZ order: X is the outermost rotation
        rx * ry * rz
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(&Euler::zero());
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_quaternion_matches_matrix() {
        let euler = Euler::from_degrees(-37.5, -33.8, -28.0);
        let from_quat = euler.to_quaternion().to_homogeneous();
        let from_matrix = Transform::rotation_matrix(&euler);
        assert!((from_quat - from_matrix).norm() < 1e-5);
    }

    #[test]
    fn test_transform_applies_translation_last() {
        let transform = Transform {
            position: Vector3::new(10.0, 0.0, 0.0),
            rotation: Euler::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let p = transform.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        // x axis rotated a quarter turn about y points down -z
        assert!((p - Point3::new(10.0, 0.0, -2.0)).norm() < 1e-5);
    }
}
