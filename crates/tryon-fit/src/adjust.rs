use glam::Vec3;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 1.5;
/// Largest offset along any axis, in the reference unit.
pub const MAX_OFFSET: f32 = 0.05;
/// Rotation limits in degrees for X (tilt), Y (turn) and Z (roll).
pub const MAX_ROTATION_DEGREES: Vec3 = Vec3::new(180.0, 45.0, 45.0);

/// Manual corrections layered on top of the fitted placement.
///
/// The incremental setters keep values inside the UI ranges. The fitter
/// passes whatever it is given straight through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAdjust {
    pub scale: f32,
    pub offset: Vec3,
    pub rotation_degrees: Vec3,
}

impl Default for UserAdjust {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
        }
    }
}

impl UserAdjust {
    pub fn adjust_scale(&mut self, delta: f32) {
        self.scale = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn adjust_offset(&mut self, delta: Vec3) {
        self.offset = (self.offset + delta).clamp(Vec3::splat(-MAX_OFFSET), Vec3::splat(MAX_OFFSET));
    }

    pub fn adjust_rotation(&mut self, delta_degrees: Vec3) {
        self.rotation_degrees = (self.rotation_degrees + delta_degrees)
            .clamp(-MAX_ROTATION_DEGREES, MAX_ROTATION_DEGREES);
    }

    /// Restore scale 1, no offset, no rotation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
