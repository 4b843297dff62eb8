//! Per-frame draw ordering

use glam::Mat4;
use tryon_assets::{ColorSource, MeshInstance, NodeId, SceneGraph};
use tryon_fit::{FrameOutput, OccluderKind, OcclusionMaterial, ACCESSORY_RENDER_ORDER};

/// What a draw call renders
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawSource {
    Occluder(OccluderKind),
    Accessory { node: NodeId, instance: MeshInstance },
}

/// One draw call with its fixed-function state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub source: DrawSource,
    pub model: Mat4,
    pub render_order: i32,
    pub color_write: bool,
    pub depth_write: bool,
    pub blended: bool,
    pub double_sided: bool,
}

/// Draw calls for one frame, in submission order.
///
/// Occluders come first so they own the depth buffer before any accessory
/// fragment is tested. Within the accessory, opaque primitives precede
/// blended ones.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
}

impl DrawList {
    pub fn build(scene: &SceneGraph, frame: &FrameOutput, occlusion: &OcclusionMaterial) -> Self {
        let mut items = Vec::new();

        for (kind, transform) in frame.occluders.iter() {
            items.push(DrawItem {
                source: DrawSource::Occluder(kind),
                model: frame.anchor * transform.matrix(),
                render_order: occlusion.render_order,
                color_write: occlusion.color_write,
                depth_write: occlusion.depth_write,
                blended: false,
                double_sided: false,
            });
        }

        let root = frame.accessory_world();
        scene.visit(|node, scene_node, world| {
            for instance in &scene_node.instances {
                let material = scene.material(instance);
                items.push(DrawItem {
                    source: DrawSource::Accessory {
                        node,
                        instance: *instance,
                    },
                    model: root * world,
                    render_order: ACCESSORY_RENDER_ORDER,
                    color_write: true,
                    depth_write: !material.is_blended(),
                    blended: material.is_blended(),
                    double_sided: material.double_sided,
                });
            }
        });

        // Stable, so traversal order survives within each group.
        items.sort_by_key(|item| (item.render_order, item.blended));

        Self { items }
    }

    /// Per-draw push constants in submission order. Occluders get a zero
    /// color; textured accessories are tinted white.
    pub fn push_constants(
        &self,
        scene: &SceneGraph,
        view: Mat4,
        projection: Mat4,
    ) -> Vec<DrawPushConstants> {
        self.items
            .iter()
            .map(|item| {
                let base_color = match item.source {
                    DrawSource::Occluder(_) => [0.0; 4],
                    DrawSource::Accessory { instance, .. } => {
                        match scene.material(&instance).base_color {
                            ColorSource::Factor(color) => color.to_array(),
                            ColorSource::Texture(_) => [1.0; 4],
                        }
                    }
                };
                DrawPushConstants::new(item.model, view, projection, base_color)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Push constants for a single draw
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawPushConstants {
    pub model: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

impl DrawPushConstants {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4, base_color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view_projection: (projection * view).to_cols_array_2d(),
            base_color,
        }
    }
}
