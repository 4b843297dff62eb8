//! Core types used throughout the TryOn workspace

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement of a node relative to its parent: position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform at the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a transform with position and per-axis scale, no rotation
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    /// Compute the model matrix for this transform (translation * rotation * scale)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Build an intrinsic X-then-Y-then-Z rotation from angles in degrees.
    ///
    /// The composition order is fixed: `Rx * Ry * Rz`.
    pub fn rotation_from_degrees(degrees: Vec3) -> Quat {
        let radians = degrees * (std::f32::consts::PI / 180.0);
        Quat::from_rotation_x(radians.x)
            * Quat::from_rotation_y(radians.y)
            * Quat::from_rotation_z(radians.z)
    }
}

/// RGBA color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const GREY: Color = Color::rgb(0.5, 0.5, 0.5);

    /// Create a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA values
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from an `[r, g, b, a]` array
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    /// Convert to an array [r, g, b, a]
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_matrix() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let matrix = transform.matrix();
        let translation = matrix.col(3).truncate();
        assert_eq!(translation, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let q = Transform::rotation_from_degrees(Vec3::new(90.0, 90.0, 0.0));
        let expected = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(q.abs_diff_eq(expected, 1e-6));

        // Reversed order gives a different orientation.
        let reversed = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        assert!(!q.abs_diff_eq(reversed, 1e-3));
    }

    #[test]
    fn color_from_array() {
        let color = Color::from_array([0.25, 0.5, 0.75, 1.0]);
        assert_eq!(color.to_array(), [0.25, 0.5, 0.75, 1.0]);
        assert_eq!(Color::default(), Color::WHITE);
    }
}
