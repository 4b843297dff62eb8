//! Per-frame accessory placement from the tracked face landmarks.
//!
//! Everything here is a pure function of its inputs: array scans and
//! arithmetic, no I/O and no logging, so it can run inside the tracking
//! callback every frame.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tryon_core::Transform;

use crate::adjust::UserAdjust;
use crate::calibrate::CalibrationRecord;
use crate::config::FitConstants;
use crate::occluder::OccluderRig;

/// What the landmark cloud directly tells us about the face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMeasurement {
    /// Horizontal extent of the landmarks.
    pub width: f32,
    /// Highest vertical coordinate among the landmarks.
    pub top_height: f32,
}

impl SurfaceMeasurement {
    /// Scan every landmark. Returns `None` for an empty cloud.
    pub fn measure(landmarks: &[Vec3]) -> Option<Self> {
        if landmarks.is_empty() {
            return None;
        }
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in landmarks {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            width: max_x - min_x,
            top_height: max_y,
        })
    }
}

/// Head proportions extrapolated from a face measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadEstimate {
    pub head_width: f32,
    pub crown_height: f32,
    /// Negative values lie behind the anchor.
    pub depth_offset: f32,
}

impl HeadEstimate {
    pub fn from_measurement(measurement: &SurfaceMeasurement, constants: &FitConstants) -> Self {
        Self {
            head_width: measurement.width * constants.width_expansion_factor,
            crown_height: measurement.top_height + measurement.width * constants.crown_factor,
            depth_offset: -measurement.width * constants.depth_factor,
        }
    }

    /// Head assumed before the first tracked frame.
    pub fn nominal(constants: &FitConstants) -> Self {
        Self {
            head_width: constants.reference_width,
            crown_height: constants.nominal_crown_height,
            depth_offset: constants.nominal_depth,
        }
    }
}

/// Transforms for one rendered frame, all relative to `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    pub anchor: Mat4,
    pub accessory: Transform,
    pub occluders: OccluderRig,
    pub head: HeadEstimate,
}

impl FrameOutput {
    /// World-space matrix of the accessory root.
    pub fn accessory_world(&self) -> Mat4 {
        self.anchor * self.accessory.matrix()
    }
}

/// Accessory placement for a given head.
pub fn place_accessory(
    calibration: &CalibrationRecord,
    head: &HeadEstimate,
    adjust: &UserAdjust,
    constants: &FitConstants,
) -> Transform {
    let live_scale =
        calibration.base_scale * (head.head_width / constants.reference_width) * adjust.scale;

    Transform {
        position: Vec3::new(
            -live_scale * calibration.raw_center_x + adjust.offset.x,
            head.crown_height - live_scale * calibration.raw_attachment_height + adjust.offset.y,
            head.depth_offset - live_scale * calibration.raw_center_z + adjust.offset.z,
        ),
        rotation: Transform::rotation_from_degrees(adjust.rotation_degrees),
        scale: Vec3::splat(live_scale),
    }
}

/// Fit against an already measured face.
pub fn fit_measured(
    calibration: &CalibrationRecord,
    measurement: &SurfaceMeasurement,
    anchor: Mat4,
    adjust: &UserAdjust,
    constants: &FitConstants,
) -> FrameOutput {
    let head = HeadEstimate::from_measurement(measurement, constants);
    FrameOutput {
        anchor,
        accessory: place_accessory(calibration, &head, adjust, constants),
        occluders: OccluderRig::fitted(measurement, &head, constants),
        head,
    }
}

/// Fit the accessory and occluders to one frame of landmarks.
///
/// An empty landmark set falls back to the nominal measurement from
/// [`FitConstants::nominal_measurement`].
pub fn fit(
    calibration: &CalibrationRecord,
    landmarks: &[Vec3],
    anchor: Mat4,
    adjust: &UserAdjust,
    constants: &FitConstants,
) -> FrameOutput {
    let measurement = SurfaceMeasurement::measure(landmarks)
        .unwrap_or_else(|| constants.nominal_measurement());
    fit_measured(calibration, &measurement, anchor, adjust, constants)
}

/// Placement shown as soon as an accessory loads, before any face is seen.
pub fn initial_placement(
    calibration: &CalibrationRecord,
    adjust: &UserAdjust,
    constants: &FitConstants,
) -> FrameOutput {
    let head = HeadEstimate::nominal(constants);
    FrameOutput {
        anchor: Mat4::IDENTITY,
        accessory: place_accessory(calibration, &head, adjust, constants),
        occluders: OccluderRig::rest(constants),
        head,
    }
}
