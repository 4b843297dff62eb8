//! The accessory currently on screen, shared between the load path and the
//! per-frame fit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};
use tryon_assets::SceneGraph;

use crate::calibrate::CalibrationRecord;
use crate::error::FitError;

/// A loaded, calibrated accessory. Immutable once built; replaced as a whole.
#[derive(Debug, Clone)]
pub struct ActiveAccessory {
    pub id: String,
    pub scene: SceneGraph,
    pub calibration: CalibrationRecord,
}

/// Identifies one load request. Completing a ticket that is no longer the
/// latest request is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub id: String,
}

/// Holder of the active accessory.
///
/// Readers get an `Arc` snapshot, so a fit never sees a record that is half
/// old and half new.
#[derive(Debug, Default)]
pub struct AccessorySlot {
    active: RwLock<Option<Arc<ActiveAccessory>>>,
    requested: Mutex<Option<LoadTicket>>,
    /// Last generation handed out. Never reset, so tickets stay unique.
    generation: AtomicU64,
}

impl AccessorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request for `id`, superseding any earlier one.
    pub fn request(&self, id: impl Into<String>) -> LoadTicket {
        let mut requested = self.requested.lock();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let ticket = LoadTicket {
            generation,
            id: id.into(),
        };
        *requested = Some(ticket.clone());
        ticket
    }

    /// Finish a request. Installs the accessory only when `ticket` is still
    /// the latest request and the load succeeded; otherwise the previous
    /// accessory stays active. Returns whether anything was installed.
    pub fn complete(
        &self,
        ticket: &LoadTicket,
        result: Result<ActiveAccessory, FitError>,
    ) -> bool {
        let mut requested = self.requested.lock();
        if requested.as_ref() != Some(ticket) {
            info!("Discarding stale load of '{}'", ticket.id);
            return false;
        }
        *requested = None;

        match result {
            Ok(accessory) => {
                info!("Activated accessory '{}'", accessory.id);
                *self.active.write() = Some(Arc::new(accessory));
                true
            }
            Err(e) => {
                warn!("Failed to load accessory '{}': {}", ticket.id, e);
                false
            }
        }
    }

    pub fn current(&self) -> Option<Arc<ActiveAccessory>> {
        self.active.read().clone()
    }

    /// Id of the request still in flight, if any.
    pub fn pending(&self) -> Option<String> {
        self.requested.lock().as_ref().map(|t| t.id.clone())
    }

    /// Remove the active accessory and forget any pending request.
    pub fn clear(&self) {
        *self.requested.lock() = None;
        *self.active.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tryon_assets::{assemble, SceneDescription};

    fn accessory(id: &str, base_scale: f32) -> ActiveAccessory {
        ActiveAccessory {
            id: id.to_string(),
            scene: assemble(&SceneDescription::default(), None),
            calibration: CalibrationRecord {
                base_scale,
                raw_center_x: 0.0,
                raw_center_z: 0.0,
                raw_attachment_height: 0.0,
            },
        }
    }

    #[test]
    fn completed_request_becomes_active() {
        let slot = AccessorySlot::new();
        let ticket = slot.request("bob.glb");
        assert_eq!(slot.pending().as_deref(), Some("bob.glb"));
        assert!(slot.complete(&ticket, Ok(accessory("bob.glb", 1.0))));
        assert_eq!(slot.current().unwrap().id, "bob.glb");
        assert!(slot.pending().is_none());
    }

    #[test]
    fn stale_result_is_discarded() {
        let slot = AccessorySlot::new();
        let old = slot.request("bob.glb");
        let new = slot.request("curls.glb");

        assert!(!slot.complete(&old, Ok(accessory("bob.glb", 1.0))));
        assert!(slot.current().is_none());

        assert!(slot.complete(&new, Ok(accessory("curls.glb", 2.0))));
        assert_eq!(slot.current().unwrap().calibration.base_scale, 2.0);
    }

    #[test]
    fn failure_keeps_previous_accessory() {
        let slot = AccessorySlot::new();
        let first = slot.request("bob.glb");
        slot.complete(&first, Ok(accessory("bob.glb", 1.0)));

        let second = slot.request("flat.glb");
        assert!(!slot.complete(&second, Err(FitError::DegenerateGeometry)));
        assert_eq!(slot.current().unwrap().id, "bob.glb");
    }

    #[test]
    fn reload_after_completion_rejects_superseded_ticket() {
        let slot = AccessorySlot::new();
        let first_bob = slot.request("bob.glb");
        let curls = slot.request("curls.glb");
        assert!(slot.complete(&curls, Ok(accessory("curls.glb", 2.0))));

        let second_bob = slot.request("bob.glb");
        assert_ne!(first_bob, second_bob);

        assert!(!slot.complete(&first_bob, Ok(accessory("bob.glb", 9.0))));
        assert_eq!(slot.current().unwrap().id, "curls.glb");

        assert!(slot.complete(&second_bob, Ok(accessory("bob.glb", 1.0))));
        assert_eq!(slot.current().unwrap().calibration.base_scale, 1.0);
    }

    #[test]
    fn snapshot_survives_replacement() {
        let slot = AccessorySlot::new();
        let t = slot.request("a");
        slot.complete(&t, Ok(accessory("a", 1.0)));
        let held = slot.current().unwrap();

        let t = slot.request("b");
        slot.complete(&t, Ok(accessory("b", 3.0)));

        assert_eq!(held.calibration.base_scale, 1.0);
        assert_eq!(slot.current().unwrap().calibration.base_scale, 3.0);

        slot.clear();
        assert!(slot.current().is_none());
    }
}
