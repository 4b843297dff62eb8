//! TryOn Core - Shared value types for the TryOn workspace
//!
//! This crate provides the foundational types used by every other member:
//! - Mathematical primitives (re-exported from glam)
//! - Transform decomposition used for accessory and occluder placement
//! - Axis-aligned bounding boxes for model measurement
//! - Linear RGBA colors for material parameters

pub mod bounds;
pub mod types;

pub use bounds::Aabb;
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use types::{Color, Transform};
