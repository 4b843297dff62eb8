//! Accessory calibration: one-time measurement of a model's own geometry.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tryon_assets::SceneGraph;

use crate::error::FitError;

/// Scale and raw anchor points of an accessory, measured once per asset in
/// its own root-relative space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Multiplier that maps the model's widest horizontal extent to the
    /// reference width.
    pub base_scale: f32,
    pub raw_center_x: f32,
    pub raw_center_z: f32,
    /// Point the inner cavity should align with the crown: midway between
    /// the box's vertical center and its top.
    pub raw_attachment_height: f32,
}

/// Measure an assembled accessory.
///
/// Fails with [`FitError::DegenerateGeometry`] when the bounding box has no
/// width and no depth.
pub fn calibrate(scene: &SceneGraph, reference_width: f32) -> Result<CalibrationRecord, FitError> {
    let bounds = scene.bounds();
    let size = bounds.size();
    let max_horizontal = size.x.max(size.z);

    if !(max_horizontal > 0.0) || !max_horizontal.is_finite() {
        return Err(FitError::DegenerateGeometry);
    }

    let center = bounds.center();
    let record = CalibrationRecord {
        base_scale: reference_width / max_horizontal,
        raw_center_x: center.x,
        raw_center_z: center.z,
        raw_attachment_height: (center.y + bounds.max.y) * 0.5,
    };

    debug!(
        "Calibrated accessory: size ({:.4}, {:.4}, {:.4}), base scale {:.4}",
        size.x, size.y, size.z, record.base_scale
    );

    Ok(record)
}
