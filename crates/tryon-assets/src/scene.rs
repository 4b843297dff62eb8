//! Scene assembly: an index-addressed node arena built from a description.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use tracing::{debug, warn};
use tryon_core::Aabb;

use crate::description::{Node, SceneDescription};
use crate::format::SourceFormat;
use crate::geometry::{GeometryResolver, PrimitiveGeometry};
use crate::material::{build_materials, MaterialParams};
use crate::texture::{load_images, TextureAsset};

static FALLBACK_MATERIAL: MaterialParams = MaterialParams::FALLBACK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// One drawable attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInstance {
    pub geometry: GeometryId,
    pub material: Option<MaterialId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Mat4,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub instances: Vec<MeshInstance>,
}

/// Assembled scene. Geometry, materials and images are shared behind `Arc`
/// so a clone per tracked instance only copies the node list.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    geometries: Arc<[PrimitiveGeometry]>,
    materials: Arc<[MaterialParams]>,
    images: Arc<[Option<TextureAsset>]>,
    correction: Mat4,
}

impl SceneGraph {
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&PrimitiveGeometry> {
        self.geometries.get(id.0)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn materials(&self) -> &[MaterialParams] {
        &self.materials
    }

    /// Material of an instance, or the grey fallback when it has none.
    pub fn material(&self, instance: &MeshInstance) -> &MaterialParams {
        instance
            .material
            .and_then(|id| self.materials.get(id.0))
            .unwrap_or(&FALLBACK_MATERIAL)
    }

    pub fn image(&self, id: crate::material::ImageId) -> Option<&TextureAsset> {
        self.images.get(id.0)?.as_ref()
    }

    pub fn correction(&self) -> Mat4 {
        self.correction
    }

    /// Apply the source format's correction above every root.
    pub fn with_correction(mut self, format: SourceFormat) -> Self {
        self.correction = format.correction();
        self
    }

    /// Visit every node reachable from the roots with its root-relative
    /// transform (correction included), parents before children.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &SceneNode, Mat4)) {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, self.correction))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if std::mem::replace(&mut visited[id.0], true) {
                continue;
            }
            let world = parent_world * node.local;
            f(id, node, world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Union bounding box of every float position reachable from the roots.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        self.visit(|_, node, world| {
            for instance in &node.instances {
                let Some(points) = self
                    .geometry(instance.geometry)
                    .and_then(|g| g.positions.as_vec3())
                else {
                    continue;
                };
                let mut local = Aabb::EMPTY;
                local.extend_transformed(&world, points);
                aabb = aabb.union(&local);
            }
        });
        aabb
    }

    /// Number of mesh instances reachable from the roots.
    pub fn instance_count(&self) -> usize {
        let mut count = 0;
        self.visit(|_, node, _| count += node.instances.len());
        count
    }
}

fn float_array<const N: usize>(values: Option<&Vec<f32>>) -> Option<[f32; N]> {
    values?.as_slice().try_into().ok()
}

/// Local transform of a node: the matrix when it holds 16 values, otherwise
/// translation * rotation * scale with per-field defaults.
pub fn local_transform(node: &Node) -> Mat4 {
    if let Some(m) = float_array::<16>(node.matrix.as_ref()) {
        return Mat4::from_cols_array(&m);
    }

    let translation = float_array::<3>(node.translation.as_ref())
        .map(Vec3::from_array)
        .unwrap_or(Vec3::ZERO);
    let rotation = float_array::<4>(node.rotation.as_ref())
        .map(Quat::from_array)
        .filter(|q| q.length_squared() > f32::EPSILON)
        .map(Quat::normalize)
        .unwrap_or(Quat::IDENTITY);
    let scale = float_array::<3>(node.scale.as_ref())
        .map(Vec3::from_array)
        .unwrap_or(Vec3::ONE);

    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Whether `candidate` is `node` or one of its ancestors.
fn is_ancestor_or_self(nodes: &[SceneNode], candidate: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(i) = current {
        if i == candidate {
            return true;
        }
        current = nodes[i].parent.map(|p| p.0);
    }
    false
}

/// Build a scene graph from a decoded description and its binary payload.
pub fn assemble(description: &SceneDescription, payload: Option<&[u8]>) -> SceneGraph {
    let resolver = GeometryResolver::new(description, payload);
    let images = load_images(description, &resolver);
    let materials = build_materials(&description.materials, &description.textures, &images);

    // Resolve each mesh once; nodes sharing a mesh share its geometry.
    let mut geometries = Vec::new();
    let mesh_instances: Vec<Vec<MeshInstance>> = description
        .meshes
        .iter()
        .enumerate()
        .map(|(mesh_index, mesh)| {
            let mut instances = Vec::new();
            for (prim_index, primitive) in mesh.primitives.iter().enumerate() {
                let Some(geometry) = resolver.build_primitive_geometry(primitive) else {
                    debug!("dropping primitive {} of mesh {}", prim_index, mesh_index);
                    continue;
                };
                let material = primitive
                    .material
                    .filter(|&m| m < materials.len())
                    .map(MaterialId);
                instances.push(MeshInstance {
                    geometry: GeometryId(geometries.len()),
                    material,
                });
                geometries.push(geometry);
            }
            instances
        })
        .collect();

    let mut nodes: Vec<SceneNode> = description
        .nodes
        .iter()
        .map(|node| SceneNode {
            name: node.name.clone(),
            local: local_transform(node),
            parent: None,
            children: Vec::new(),
            instances: node
                .mesh
                .and_then(|m| mesh_instances.get(m))
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    for (parent, node) in description.nodes.iter().enumerate() {
        for &child in &node.children {
            if child >= nodes.len() {
                debug!("node {} lists missing child {}", parent, child);
                continue;
            }
            if nodes[child].parent.is_some() || is_ancestor_or_self(&nodes, child, parent) {
                warn!("ignoring edge {} -> {}: not a tree", parent, child);
                continue;
            }
            nodes[child].parent = Some(NodeId(parent));
            nodes[parent].children.push(NodeId(child));
        }
    }

    let declared_roots = description
        .scenes
        .get(description.scene.unwrap_or(0))
        .and_then(|scene| scene.nodes.as_ref());

    let roots: Vec<NodeId> = match declared_roots {
        Some(list) => list
            .iter()
            .copied()
            .filter(|&i| i < nodes.len())
            .map(NodeId)
            .collect(),
        None => (0..nodes.len())
            .filter(|&i| nodes[i].parent.is_none())
            .map(NodeId)
            .collect(),
    };

    debug!(
        "assembled {} nodes, {} roots, {} geometries, {} materials",
        nodes.len(),
        roots.len(),
        geometries.len(),
        materials.len()
    );

    SceneGraph {
        nodes,
        roots,
        geometries: geometries.into(),
        materials: materials.into(),
        images: images.into(),
        correction: Mat4::IDENTITY,
    }
}
