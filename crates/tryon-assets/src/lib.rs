//! TryOn Assets - Accessory container decoding and scene assembly
//!
//! Reads the binary scene container (GLB layout) without any external glTF
//! loader: chunks are split by [`container`], accessors are resolved into
//! vertex data by [`geometry`], materials and embedded images by
//! [`material`] and [`texture`], and [`scene`] assembles the node arena.
//!
//! Structural problems with the container are fatal ([`DecodeError`]);
//! problems with individual references only drop the affected feature.

mod error;

pub mod container;
pub mod description;
pub mod format;
pub mod geometry;
pub mod material;
pub mod scene;
pub mod source;
pub mod texture;

pub use container::{decode_container, encode_container, DecodedContainer};
pub use description::SceneDescription;
pub use error::{AssetError, DecodeError};
pub use format::SourceFormat;
pub use geometry::{GeometryResolver, Indices, PrimitiveGeometry, VertexAttribute};
pub use material::{build_materials, AlphaMode, ColorSource, MaterialParams, ScalarSource};
pub use scene::{assemble, GeometryId, MaterialId, MeshInstance, NodeId, SceneGraph};
pub use source::{AssetSource, DirectorySource};
pub use texture::TextureAsset;

/// Decode container bytes and assemble the scene graph in one step.
pub fn load_scene(bytes: &[u8]) -> Result<SceneGraph, DecodeError> {
    let decoded = decode_container(bytes)?;
    Ok(assemble(&decoded.description, decoded.payload.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{CHUNK_JSON, CONTAINER_MAGIC};

    #[test]
    fn scene_without_payload_keeps_node_but_drops_geometry() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "nodes": [{ "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
            "accessors": [{ "count": 3, "componentType": 5126, "type": "VEC3" }]
        }"#;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&((20 + json.len()) as u32).to_le_bytes());
        bytes.extend_from_slice(&(json.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        bytes.extend_from_slice(json);

        let decoded = decode_container(&bytes).unwrap();
        assert!(decoded.payload.is_none());

        let resolver = GeometryResolver::new(&decoded.description, None);
        let primitive = &decoded.description.meshes[0].primitives[0];
        assert!(resolver.build_primitive_geometry(primitive).is_none());

        let graph = load_scene(&bytes).unwrap();
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.roots(), &[NodeId(0)]);
        assert!(graph.nodes()[0].instances.is_empty());
    }

    #[test]
    fn encoded_scene_loads_with_payload() {
        let points: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let payload: Vec<u8> = points
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let json = format!(
            r#"{{
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [{{ "mesh": 0, "translation": [0, 1, 0] }}],
                "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
                "materials": [{{ "pbrMetallicRoughness": {{ "baseColorFactor": [0.5, 0.25, 0.125, 1] }} }}],
                "buffers": [{{ "byteLength": {len} }}],
                "bufferViews": [{{ "buffer": 0, "byteLength": {len} }}],
                "accessors": [{{ "bufferView": 0, "count": 3, "componentType": 5126, "type": "VEC3" }}]
            }}"#,
            len = payload.len()
        );
        let description: SceneDescription = serde_json::from_str(&json).unwrap();
        let bytes = encode_container(&description, Some(&payload)).unwrap();

        let graph = load_scene(&bytes).unwrap();
        assert_eq!(graph.instance_count(), 1);
        let instance = graph.nodes()[0].instances[0];
        assert_eq!(
            graph.material(&instance).base_color,
            ColorSource::Factor(tryon_core::Color::rgba(0.5, 0.25, 0.125, 1.0))
        );
        let bounds = graph.bounds();
        assert_eq!(bounds.min, glam::Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bounds.max, glam::Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn decode_failure_exposes_no_scene() {
        assert!(matches!(load_scene(b"glTF"), Err(DecodeError::InvalidHeader(_))));
    }
}
