//! TryOn Render - Renderer-facing data for the try-on view
//!
//! Converts resolved accessory geometry into GPU vertex buffers, builds the
//! invisible occluder meshes, and orders each frame's draw calls so the
//! depth-only occluders render before the accessory.

pub mod mesh;
pub mod scene;
pub mod vertex;

pub use mesh::{Mesh, OccluderMesh};
pub use scene::{DrawItem, DrawList, DrawPushConstants, DrawSource};
pub use vertex::{OccluderVertex, Vertex3D};
