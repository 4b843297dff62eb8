use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::fitter::SurfaceMeasurement;

/// Empirical proportions used to extrapolate a head from the tracked face.
///
/// These are tuned values, not derived ones. Changing them changes how the
/// accessory sits, never whether the fit is well formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConstants {
    /// Head width the accessory's base scale is normalised to.
    pub reference_width: f32,
    /// Head width relative to the measured face width.
    pub width_expansion_factor: f32,
    /// Crown height above the top landmark, as a fraction of face width.
    pub crown_factor: f32,
    /// Distance behind the anchor, as a fraction of face width.
    pub depth_factor: f32,
    /// Crown height used before the first tracked frame.
    pub nominal_crown_height: f32,
    /// Depth offset used before the first tracked frame.
    pub nominal_depth: f32,
    pub skull: SkullOccluderConfig,
    pub neck: NeckOccluderConfig,
}

/// Sizing of the ellipsoid that hides accessory geometry behind the head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkullOccluderConfig {
    /// Radius of the unit sphere mesh the occluder is scaled from.
    pub base_radius: f32,
    /// Fitted radius relative to face width.
    pub radius_ratio: f32,
    /// Vertical position relative to the top landmark height.
    pub height_ratio: f32,
    /// Per-axis stretch turning the sphere into an ellipsoid.
    pub stretch: Vec3,
    pub segments: u32,
    /// Placement before the first tracked frame.
    pub rest_position: Vec3,
}

/// Sizing of the cylinder that hides accessory geometry behind the neck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeckOccluderConfig {
    pub base_radius: f32,
    pub base_height: f32,
    /// Fitted radius relative to face width.
    pub radius_ratio: f32,
    /// Fitted height relative to face width.
    pub height_ratio: f32,
    /// Vertical position as a multiple of the fitted height.
    pub vertical_offset: f32,
    /// Depth as a multiple of the skull depth offset.
    pub depth_ratio: f32,
    pub segments: u32,
    pub rest_position: Vec3,
}

impl Default for FitConstants {
    fn default() -> Self {
        Self {
            reference_width: 0.22,
            width_expansion_factor: 1.8,
            crown_factor: 0.30,
            depth_factor: 0.55,
            nominal_crown_height: 0.11,
            nominal_depth: -0.08,
            skull: SkullOccluderConfig::default(),
            neck: NeckOccluderConfig::default(),
        }
    }
}

impl Default for SkullOccluderConfig {
    fn default() -> Self {
        Self {
            base_radius: 0.09,
            radius_ratio: 0.65,
            height_ratio: 0.5,
            stretch: Vec3::new(1.0, 1.2, 1.1),
            segments: 24,
            rest_position: Vec3::new(0.0, 0.04, -0.08),
        }
    }
}

impl Default for NeckOccluderConfig {
    fn default() -> Self {
        Self {
            base_radius: 0.05,
            base_height: 0.12,
            radius_ratio: 0.45,
            height_ratio: 1.5,
            vertical_offset: -0.4,
            depth_ratio: 0.5,
            segments: 16,
            rest_position: Vec3::new(0.0, -0.06, -0.04),
        }
    }
}

impl FitConstants {
    /// Measurement assumed when a frame carries no landmarks and none was
    /// seen before. Chosen so the extrapolated head width equals the
    /// reference width and the crown lands at the nominal height.
    pub fn nominal_measurement(&self) -> SurfaceMeasurement {
        let width = if self.width_expansion_factor > 0.0 {
            self.reference_width / self.width_expansion_factor
        } else {
            self.reference_width
        };
        SurfaceMeasurement {
            width,
            top_height: self.nominal_crown_height - width * self.crown_factor,
        }
    }
}
