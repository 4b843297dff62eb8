//! Vertex types uploaded to the GPU

use bytemuck::{Pod, Zeroable};

/// Lit accessory vertex with position, normal, and texture coordinate
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3D {
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Depth-only occluder vertex with just position
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct OccluderVertex {
    pub position: [f32; 3],
}

impl OccluderVertex {
    pub fn new(position: [f32; 3]) -> Self {
        Self { position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_tightly_packed() {
        assert_eq!(Vertex3D::STRIDE, 32);
        assert_eq!(std::mem::size_of::<OccluderVertex>(), 12);

        let v = [Vertex3D::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.25])];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[24..28], &0.5f32.to_ne_bytes());
    }
}
