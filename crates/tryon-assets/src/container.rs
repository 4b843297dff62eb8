//! Binary scene container (GLB layout) reader and writer.
//!
//! Layout, all little-endian:
//!
//! ```text
//! magic: u32 = "glTF" | version: u32 = 2 | total_length: u32
//! repeated { chunk_length: u32 | chunk_type: u32 | chunk_length bytes }
//! ```
//!
//! The declared total length is informational; parsing is driven by the chunk
//! headers. Trailing bytes too short to hold another chunk header are ignored.

use tracing::{debug, warn};

use crate::description::SceneDescription;
use crate::error::DecodeError;

pub const CONTAINER_MAGIC: u32 = 0x4654_6C67; // "glTF"
pub const CONTAINER_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
pub const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Result of decoding a container: the scene description plus the raw binary
/// payload that backs its buffer views, if the container carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedContainer {
    pub version: u32,
    pub description: SceneDescription,
    pub payload: Option<Vec<u8>>,
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le(bytemuck::pod_read_unaligned(&bytes[offset..offset + 4]))
}

/// Decode a binary container into its scene description and binary payload.
pub fn decode_container(bytes: &[u8]) -> Result<DecodedContainer, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::InvalidHeader(format!(
            "need {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }

    let magic = read_u32(bytes, 0);
    if magic != CONTAINER_MAGIC {
        return Err(DecodeError::InvalidHeader(format!("bad magic 0x{magic:08X}")));
    }

    let version = read_u32(bytes, 4);
    if version != CONTAINER_VERSION {
        return Err(DecodeError::InvalidHeader(format!("unsupported version {version}")));
    }

    let declared_len = read_u32(bytes, 8) as usize;
    if declared_len != bytes.len() {
        debug!(
            "container declares {} bytes, buffer holds {}",
            declared_len,
            bytes.len()
        );
    }

    let mut offset = HEADER_LEN;
    let mut json: Option<&[u8]> = None;
    let mut payload: Option<&[u8]> = None;

    while bytes.len() - offset >= CHUNK_HEADER_LEN {
        let chunk_len = read_u32(bytes, offset) as usize;
        let chunk_type = read_u32(bytes, offset + 4);
        let body_start = offset + CHUNK_HEADER_LEN;
        let remaining = bytes.len() - body_start;

        if chunk_len > remaining {
            return Err(DecodeError::InvalidChunk {
                offset,
                declared: chunk_len,
                remaining,
            });
        }

        let body = &bytes[body_start..body_start + chunk_len];
        match chunk_type {
            CHUNK_JSON => {
                if json.replace(body).is_some() {
                    warn!("chunk 0x{:08X} at offset {} replaces an earlier one", chunk_type, offset);
                }
            }
            CHUNK_BIN => {
                if payload.replace(body).is_some() {
                    warn!("chunk 0x{:08X} at offset {} replaces an earlier one", chunk_type, offset);
                }
            }
            other => debug!("skipping unknown chunk 0x{:08X} ({} bytes)", other, chunk_len),
        }

        offset = body_start + chunk_len;
    }

    let json = json.ok_or(DecodeError::NoSceneChunk)?;
    let description = parse_description(json)?;

    Ok(DecodedContainer {
        version,
        description,
        payload: payload.map(<[u8]>::to_vec),
    })
}

/// Parse the structured chunk. It must be a JSON object; anything that does
/// not fit the description's field types is rejected as a whole.
fn parse_description(json: &[u8]) -> Result<SceneDescription, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(json)
        .map_err(|e| DecodeError::MalformedSceneData(e.to_string()))?;

    if !value.is_object() {
        return Err(DecodeError::MalformedSceneData(
            "top-level value is not an object".into(),
        ));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::MalformedSceneData(e.to_string()))
}

/// Encode a scene description and optional binary payload into a container.
///
/// The JSON chunk is padded with spaces and the binary chunk with zeros so
/// that every chunk starts on a 4-byte boundary.
pub fn encode_container(
    description: &SceneDescription,
    payload: Option<&[u8]>,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut json = serde_json::to_vec(description)?;
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let mut bin = payload.map(<[u8]>::to_vec);
    if let Some(bin) = bin.as_mut() {
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
    }

    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json.len()
        + bin.as_ref().map_or(0, |b| CHUNK_HEADER_LEN + b.len());

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
    out.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);

    if let Some(bin) = bin {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{Material, Mesh, Node, PbrMetallicRoughness, Primitive, SceneRoots};

    fn chunk(ty: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&ty.to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn header(version: u32, total: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out
    }

    fn sample_description() -> SceneDescription {
        let mut primitive = Primitive::default();
        primitive.attributes.insert("POSITION".into(), 0);
        primitive.material = Some(0);

        SceneDescription {
            scene: Some(0),
            scenes: vec![SceneRoots {
                name: None,
                nodes: Some(vec![0]),
            }],
            nodes: vec![
                Node {
                    name: Some("root".into()),
                    translation: Some(vec![0.0, 0.1, -0.2]),
                    children: vec![1],
                    ..Default::default()
                },
                Node {
                    name: Some("hair".into()),
                    mesh: Some(0),
                    ..Default::default()
                },
            ],
            meshes: vec![Mesh {
                name: Some("hair".into()),
                primitives: vec![primitive],
            }],
            materials: vec![Material {
                pbr_metallic_roughness: Some(PbrMetallicRoughness {
                    base_color_factor: Some([0.2, 0.1, 0.05, 1.0]),
                    roughness_factor: Some(0.6),
                    ..Default::default()
                }),
                alpha_mode: Some("MASK".into()),
                double_sided: Some(true),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn round_trip_preserves_description() {
        let desc = sample_description();
        let payload = [1u8, 2, 3, 4, 5];
        let bytes = encode_container(&desc, Some(&payload)).unwrap();
        assert_eq!(bytes.len() % 4, 0);

        let decoded = decode_container(&bytes).unwrap();
        assert_eq!(decoded.version, 2);
        assert_eq!(decoded.description, desc);
        // Payload keeps its alignment padding.
        assert_eq!(decoded.payload.unwrap(), vec![1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn short_buffer_is_invalid_header() {
        assert!(matches!(
            decode_container(&[0x67, 0x6C, 0x54]),
            Err(DecodeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn wrong_magic_is_invalid_header() {
        let mut bytes = header(2, 12);
        bytes[0] = b'X';
        assert!(matches!(decode_container(&bytes), Err(DecodeError::InvalidHeader(_))));
    }

    #[test]
    fn wrong_version_is_invalid_header() {
        let bytes = header(1, 12);
        assert!(matches!(decode_container(&bytes), Err(DecodeError::InvalidHeader(_))));
    }

    #[test]
    fn missing_json_chunk() {
        let mut bytes = header(2, 0);
        bytes.extend(chunk(CHUNK_BIN, &[0, 0, 0, 0]));
        assert!(matches!(decode_container(&bytes), Err(DecodeError::NoSceneChunk)));
    }

    #[test]
    fn oversized_chunk_is_invalid_chunk() {
        let mut bytes = header(2, 0);
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        bytes.extend_from_slice(b"{}");
        match decode_container(&bytes) {
            Err(DecodeError::InvalidChunk {
                offset,
                declared,
                remaining,
            }) => {
                assert_eq!(offset, 12);
                assert_eq!(declared, 100);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected InvalidChunk, got: {:?}", other),
        }
    }

    #[test]
    fn non_object_json_is_malformed() {
        let mut bytes = header(2, 0);
        bytes.extend(chunk(CHUNK_JSON, b"[1, 2]  "));
        assert!(matches!(
            decode_container(&bytes),
            Err(DecodeError::MalformedSceneData(_))
        ));

        let mut bytes = header(2, 0);
        bytes.extend(chunk(CHUNK_JSON, b"{nope"));
        assert!(matches!(
            decode_container(&bytes),
            Err(DecodeError::MalformedSceneData(_))
        ));
    }

    #[test]
    fn unknown_chunks_and_trailing_padding_are_tolerated() {
        let mut bytes = header(2, 0);
        bytes.extend(chunk(0x1234_5678, b"junk"));
        bytes.extend(chunk(CHUNK_JSON, b"{}  "));
        bytes.extend_from_slice(&[0, 0, 0]);

        let decoded = decode_container(&bytes).unwrap();
        assert_eq!(decoded.description, SceneDescription::default());
        assert!(decoded.payload.is_none());
    }

    #[test]
    fn last_chunk_of_each_kind_wins() {
        let mut bytes = header(2, 0);
        bytes.extend(chunk(CHUNK_JSON, br#"{"scene":0}"#));
        bytes.extend(chunk(CHUNK_BIN, &[1, 2, 3, 4]));
        bytes.extend(chunk(CHUNK_JSON, br#"{"scene":5}"#));
        bytes.extend(chunk(CHUNK_BIN, &[9, 9, 9, 9]));
        let decoded = decode_container(&bytes).unwrap();
        assert_eq!(decoded.description.scene, Some(5));
        assert_eq!(decoded.payload.as_deref(), Some(&[9u8, 9, 9, 9][..]));
    }
}
