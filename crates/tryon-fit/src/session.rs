//! Glue between the tracking callbacks and the fitter.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::active::AccessorySlot;
use crate::adjust::UserAdjust;
use crate::config::FitConstants;
use crate::fitter::{fit_measured, initial_placement, FrameOutput, SurfaceMeasurement};
use crate::loader::{AccessoryLoader, PendingLoad};

/// One try-on session: the active accessory, the user's adjustments and the
/// state carried between tracked frames.
pub struct TryOnSession {
    slot: Arc<AccessorySlot>,
    loader: AccessoryLoader,
    pending: Option<PendingLoad>,
    constants: FitConstants,
    adjust: UserAdjust,
    tracked: bool,
    last_measurement: Option<SurfaceMeasurement>,
}

impl TryOnSession {
    pub fn new(loader: AccessoryLoader, constants: FitConstants) -> Self {
        Self {
            slot: Arc::new(AccessorySlot::new()),
            loader,
            pending: None,
            constants,
            adjust: UserAdjust::default(),
            tracked: false,
            last_measurement: None,
        }
    }

    /// Start loading `id`. Any load still in flight is abandoned; the current
    /// accessory stays on screen until the new one is ready.
    pub fn select_accessory(&mut self, id: impl Into<String>) {
        let ticket = self.slot.request(id);
        info!("Requested accessory '{}'", ticket.id);
        self.pending = Some(self.loader.load(ticket));
    }

    /// Collect a finished load without blocking. Returns the placement to show
    /// when a new accessory became active.
    pub fn poll_loads(&mut self) -> Option<FrameOutput> {
        let result = self.pending.as_ref()?.try_recv()?;
        let pending = self.pending.take()?;
        if !self.slot.complete(pending.ticket(), result) {
            return None;
        }
        self.current_placement()
    }

    /// Block until the pending load, if any, has finished.
    pub fn wait_for_load(&mut self) -> Option<FrameOutput> {
        let pending = self.pending.take()?;
        let ticket = pending.ticket().clone();
        if !self.slot.complete(&ticket, pending.wait()) {
            return None;
        }
        self.current_placement()
    }

    /// A face was found.
    pub fn on_anchor_added(&mut self, anchor: Mat4, landmarks: &[Vec3]) -> Option<FrameOutput> {
        debug!("Tracking acquired");
        self.tracked = true;
        self.on_frame(anchor, landmarks)
    }

    /// A tracked frame arrived. `None` means keep the previous transforms.
    pub fn on_frame(&mut self, anchor: Mat4, landmarks: &[Vec3]) -> Option<FrameOutput> {
        self.tracked = true;
        if let Some(m) = SurfaceMeasurement::measure(landmarks) {
            self.last_measurement = Some(m);
        }

        let accessory = self.slot.current()?;
        let measurement = self
            .last_measurement
            .unwrap_or_else(|| self.constants.nominal_measurement());

        Some(fit_measured(
            &accessory.calibration,
            &measurement,
            anchor,
            &self.adjust,
            &self.constants,
        ))
    }

    pub fn on_tracking_lost(&mut self) {
        debug!("Tracking lost");
        self.tracked = false;
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Placement for the active accessory when no frame is available.
    pub fn current_placement(&self) -> Option<FrameOutput> {
        let accessory = self.slot.current()?;
        Some(initial_placement(
            &accessory.calibration,
            &self.adjust,
            &self.constants,
        ))
    }

    pub fn slot(&self) -> &Arc<AccessorySlot> {
        &self.slot
    }

    pub fn constants(&self) -> &FitConstants {
        &self.constants
    }

    pub fn adjust(&self) -> &UserAdjust {
        &self.adjust
    }

    pub fn adjust_mut(&mut self) -> &mut UserAdjust {
        &mut self.adjust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::source;

    fn session() -> TryOnSession {
        let loader = AccessoryLoader::new(source(), 0.22).unwrap();
        TryOnSession::new(loader, FitConstants::default())
    }

    fn face() -> Vec<Vec3> {
        vec![
            Vec3::new(-0.045, -0.06, 0.02),
            Vec3::new(0.045, 0.0, 0.03),
            Vec3::new(0.0, 0.05, 0.04),
        ]
    }

    #[test]
    fn frames_without_accessory_are_no_ops() {
        let mut session = session();
        assert!(session.on_anchor_added(Mat4::IDENTITY, &face()).is_none());
        assert!(session.is_tracked());
        session.on_tracking_lost();
        assert!(!session.is_tracked());
    }

    #[test]
    fn loaded_accessory_starts_at_initial_placement() {
        let mut session = session();
        session.select_accessory("bob.glb");
        let out = session.wait_for_load().unwrap();
        let base = session.slot().current().unwrap().calibration.base_scale;
        assert!(out.accessory.scale.abs_diff_eq(Vec3::splat(base), 1e-6));
        assert_eq!(out.anchor, Mat4::IDENTITY);
    }

    #[test]
    fn empty_frame_reuses_last_measurement() {
        let mut session = session();
        session.select_accessory("bob.glb");
        session.wait_for_load();

        let measured = session.on_frame(Mat4::IDENTITY, &face()).unwrap();
        let reused = session.on_frame(Mat4::IDENTITY, &[]).unwrap();
        assert_eq!(measured.accessory, reused.accessory);
        assert_eq!(measured.occluders, reused.occluders);
    }

    #[test]
    fn failed_load_keeps_previous_accessory() {
        let mut session = session();
        session.select_accessory("bob.glb");
        session.wait_for_load();

        session.select_accessory("broken.glb");
        assert!(session.wait_for_load().is_none());
        assert_eq!(session.slot().current().unwrap().id, "bob.glb");
        assert!(session.on_frame(Mat4::IDENTITY, &face()).is_some());
    }

    #[test]
    fn adjustments_flow_into_fit() {
        let mut session = session();
        session.select_accessory("bob.glb");
        session.wait_for_load();

        let before = session.on_frame(Mat4::IDENTITY, &face()).unwrap();
        session.adjust_mut().adjust_scale(0.25);
        let after = session.on_frame(Mat4::IDENTITY, &face()).unwrap();
        assert!(after.accessory.scale.abs_diff_eq(before.accessory.scale * 1.25, 1e-6));

        session.adjust_mut().reset();
        let reset = session.on_frame(Mat4::IDENTITY, &face()).unwrap();
        assert_eq!(reset.accessory, before.accessory);
    }
}
