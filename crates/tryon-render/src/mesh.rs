//! Mesh generation utilities

use crate::vertex::{OccluderVertex, Vertex3D};
use glam::Vec3;
use std::f32::consts::PI;
use tracing::warn;
use tryon_assets::PrimitiveGeometry;
use tryon_fit::{FitConstants, OccluderKind};

/// Accessory mesh ready for upload
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert resolved primitive geometry into interleaved vertices.
    ///
    /// Returns `None` when positions are not 32-bit floats. Missing normals
    /// point up and missing texture coordinates are zero. Triangles that
    /// reference a vertex past the end are skipped.
    pub fn from_geometry(geometry: &PrimitiveGeometry) -> Option<Self> {
        let Some(positions) = geometry.positions.as_vec3() else {
            warn!("Skipping primitive with non-float positions");
            return None;
        };
        let normals = geometry.normals.as_ref().and_then(|n| n.as_vec3());
        let uvs = geometry.tex_coords.as_ref().and_then(|t| t.as_vec2());

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let normal = normals.and_then(|n| n.get(i)).copied().unwrap_or([0.0, 1.0, 0.0]);
                let uv = uvs.and_then(|t| t.get(i)).copied().unwrap_or([0.0, 0.0]);
                Vertex3D::new(p, normal, uv)
            })
            .collect::<Vec<_>>();

        let count = vertices.len() as u32;
        let indices = geometry
            .indices
            .triangles_u32()
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect();

        Some(Self { vertices, indices })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Depth-only occluder mesh
#[derive(Clone, Debug, Default)]
pub struct OccluderMesh {
    pub vertices: Vec<OccluderVertex>,
    pub indices: Vec<u32>,
}

impl OccluderMesh {
    /// Generate a UV sphere mesh
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = radius * phi.cos();
            let ring_radius = radius * phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(OccluderVertex::new([x, y, z]));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self { vertices, indices }
    }

    /// Generate a capped cylinder centered on the origin, axis along Y
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let half_height = height / 2.0;

        // Side walls: top ring then bottom ring
        for ring in 0..=1 {
            let y = half_height - ring as f32 * height;

            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                vertices.push(OccluderVertex::new([
                    radius * theta.cos(),
                    y,
                    radius * theta.sin(),
                ]));
            }
        }

        for seg in 0..segments {
            let current = seg;
            let next = current + segments + 1;

            indices.push(current);
            indices.push(next);
            indices.push(current + 1);

            indices.push(current + 1);
            indices.push(next);
            indices.push(next + 1);
        }

        // Caps fan out from a center vertex over the wall rings
        let top_center = vertices.len() as u32;
        vertices.push(OccluderVertex::new([0.0, half_height, 0.0]));
        let bottom_center = vertices.len() as u32;
        vertices.push(OccluderVertex::new([0.0, -half_height, 0.0]));

        for seg in 0..segments {
            indices.push(top_center);
            indices.push(seg + 1);
            indices.push(seg);

            let bottom = segments + 1 + seg;
            indices.push(bottom_center);
            indices.push(bottom);
            indices.push(bottom + 1);
        }

        Self { vertices, indices }
    }

    /// Depth-only copy of the tracked face mesh.
    pub fn from_surface(points: &[Vec3], triangles: &[u32]) -> Self {
        let count = points.len() as u32;
        Self {
            vertices: points
                .iter()
                .map(|p| OccluderVertex::new(p.to_array()))
                .collect(),
            indices: triangles
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < count))
                .flatten()
                .copied()
                .collect(),
        }
    }

    /// Base mesh for a skull or neck occluder. The face occluder is built
    /// from the tracked surface instead, so it has no base mesh.
    pub fn for_kind(kind: OccluderKind, constants: &FitConstants) -> Option<Self> {
        match kind {
            OccluderKind::Face => None,
            OccluderKind::Skull => Some(Self::sphere(
                constants.skull.base_radius,
                constants.skull.segments,
                constants.skull.segments / 2,
            )),
            OccluderKind::Neck => Some(Self::cylinder(
                constants.neck.base_radius,
                constants.neck.base_height,
                constants.neck.segments,
            )),
        }
    }

    /// Extremes of the mesh along each axis.
    pub fn extent(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from_array(v.position);
                (min.min(p), max.max(p))
            },
        )
    }
}
