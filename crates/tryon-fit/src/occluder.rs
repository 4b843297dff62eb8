//! Invisible head geometry that hides the parts of an accessory a real head
//! would cover.

use glam::Vec3;
use tryon_core::Transform;

use crate::config::FitConstants;
use crate::fitter::{HeadEstimate, SurfaceMeasurement};

/// Draw order of the accessory; occluders draw before it.
pub const ACCESSORY_RENDER_ORDER: i32 = 1;

/// Depth-only material shared by every occluder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcclusionMaterial {
    pub color_write: bool,
    pub depth_write: bool,
    pub render_order: i32,
}

impl OcclusionMaterial {
    pub const DEPTH_ONLY: OcclusionMaterial = OcclusionMaterial {
        color_write: false,
        depth_write: true,
        render_order: -1,
    };
}

impl Default for OcclusionMaterial {
    fn default() -> Self {
        Self::DEPTH_ONLY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccluderKind {
    /// The tracked face mesh itself, drawn depth-only at the anchor.
    Face,
    /// Ellipsoid covering the back and top of the head.
    Skull,
    /// Cylinder below the head.
    Neck,
}

/// Anchor-relative placements of the three occluders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccluderRig {
    pub face: Transform,
    pub skull: Transform,
    pub neck: Transform,
}

impl OccluderRig {
    /// Placement before any face has been measured.
    pub fn rest(constants: &FitConstants) -> Self {
        Self {
            face: Transform::IDENTITY,
            skull: Transform::from_position_scale(
                constants.skull.rest_position,
                constants.skull.stretch,
            ),
            neck: Transform::from_position(constants.neck.rest_position),
        }
    }

    /// Resize the skull and neck from the measured face. The accessory's own
    /// calibration plays no part.
    pub fn fitted(
        measurement: &SurfaceMeasurement,
        head: &HeadEstimate,
        constants: &FitConstants,
    ) -> Self {
        let skull = &constants.skull;
        let skull_radius = measurement.width * skull.radius_ratio;
        let radius_scale = skull_radius / skull.base_radius;

        let neck = &constants.neck;
        let neck_radius = measurement.width * neck.radius_ratio;
        let neck_height = measurement.width * neck.height_ratio;
        let r_scale = neck_radius / neck.base_radius;
        let h_scale = neck_height / neck.base_height;

        Self {
            face: Transform::IDENTITY,
            skull: Transform::from_position_scale(
                Vec3::new(
                    0.0,
                    measurement.top_height * skull.height_ratio,
                    head.depth_offset,
                ),
                skull.stretch * radius_scale,
            ),
            neck: Transform::from_position_scale(
                Vec3::new(
                    0.0,
                    neck_height * neck.vertical_offset,
                    head.depth_offset * neck.depth_ratio,
                ),
                Vec3::new(r_scale, h_scale, r_scale),
            ),
        }
    }

    pub fn get(&self, kind: OccluderKind) -> &Transform {
        match kind {
            OccluderKind::Face => &self.face,
            OccluderKind::Skull => &self.skull,
            OccluderKind::Neck => &self.neck,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OccluderKind, &Transform)> {
        [OccluderKind::Face, OccluderKind::Skull, OccluderKind::Neck]
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn occluders_draw_before_accessory() {
        assert!(OcclusionMaterial::DEPTH_ONLY.render_order < ACCESSORY_RENDER_ORDER);
        assert!(!OcclusionMaterial::DEPTH_ONLY.color_write);
        assert!(OcclusionMaterial::DEPTH_ONLY.depth_write);
    }

    #[test]
    fn rest_placement() {
        let rig = OccluderRig::rest(&FitConstants::default());
        assert_eq!(rig.face, Transform::IDENTITY);
        assert!(approx(rig.skull.position, Vec3::new(0.0, 0.04, -0.08)));
        assert!(approx(rig.skull.scale, Vec3::new(1.0, 1.2, 1.1)));
        assert!(approx(rig.neck.position, Vec3::new(0.0, -0.06, -0.04)));
        assert_eq!(rig.neck.scale, Vec3::ONE);
    }

    #[test]
    fn fitted_sizes_follow_face_width() {
        let constants = FitConstants::default();
        let measurement = SurfaceMeasurement {
            width: 0.1,
            top_height: 0.06,
        };
        let head = HeadEstimate::from_measurement(&measurement, &constants);
        let rig = OccluderRig::fitted(&measurement, &head, &constants);

        // skull radius 0.065 over the 0.09 base sphere
        let r = 0.065 / 0.09;
        assert!(approx(rig.skull.position, Vec3::new(0.0, 0.03, -0.055)));
        assert!(approx(rig.skull.scale, Vec3::new(r, r * 1.2, r * 1.1)));

        // neck radius 0.045, height 0.15
        assert!(approx(rig.neck.position, Vec3::new(0.0, -0.06, -0.0275)));
        assert!(approx(rig.neck.scale, Vec3::new(0.9, 1.25, 0.9)));
    }

    #[test]
    fn iter_visits_all_three() {
        let rig = OccluderRig::rest(&FitConstants::default());
        let kinds: Vec<_> = rig.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![OccluderKind::Face, OccluderKind::Skull, OccluderKind::Neck]);
    }
}
