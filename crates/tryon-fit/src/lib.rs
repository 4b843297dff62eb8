//! TryOn Fit - Calibration and per-frame placement of a worn accessory
//!
//! - [`calibrate`] measures an accessory once, in its own space
//! - [`fitter`] places it on the tracked face every frame
//! - [`occluder`] sizes the invisible head that hides its far side
//! - [`session`] connects tracking callbacks, background loads and the
//!   active accessory

mod error;

pub mod active;
pub mod adjust;
pub mod calibrate;
pub mod config;
pub mod fitter;
pub mod loader;
pub mod occluder;
pub mod session;

pub use active::{AccessorySlot, ActiveAccessory, LoadTicket};
pub use adjust::UserAdjust;
pub use calibrate::{calibrate, CalibrationRecord};
pub use config::FitConstants;
pub use error::FitError;
pub use fitter::{fit, fit_measured, initial_placement, FrameOutput, HeadEstimate, SurfaceMeasurement};
pub use loader::{load_accessory, AccessoryLoader, PendingLoad};
pub use occluder::{OccluderKind, OccluderRig, OcclusionMaterial, ACCESSORY_RENDER_ORDER};
pub use session::TryOnSession;
