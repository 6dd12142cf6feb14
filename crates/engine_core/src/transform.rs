//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Replace the scale with a uniform factor.
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Map a point from this transform's local space into its parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Compose `child` (expressed in this transform's local space) onto this transform.
    ///
    /// Exact for uniform scales, which is all the scene hierarchy uses.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Point the local forward axis (-Z) along `direction`. Zero directions leave the rotation untouched.
    pub fn look_along(&mut self, direction: Vec3) {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() > 0.0 {
            self.rotation = Quat::from_rotation_arc(-Vec3::Z, dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_transform_applies_parent_scale_and_rotation() {
        let parent = Transform::from_position_rotation(
            Vec3::new(0.0, -10.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        )
        .with_uniform_scale(5.0);
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_uniform_scale(0.4);

        let world = parent.mul_transform(&child);
        // +X rotated a quarter turn about +Y lands on -Z.
        assert!((world.position - Vec3::new(0.0, -10.0, -5.0)).length() < 1e-4);
        assert!((world.scale - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn look_along_points_forward_at_direction() {
        let mut t = Transform::default();
        t.look_along(Vec3::new(0.0, 0.0, 3.0));
        assert!((t.forward() - Vec3::Z).length() < 1e-5);

        let before = t.rotation;
        t.look_along(Vec3::ZERO);
        assert_eq!(t.rotation, before);
    }
}
