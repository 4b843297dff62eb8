use tracing::warn;

use crate::description::SceneDescription;
use crate::error::AssetError;
use crate::geometry::GeometryResolver;

/// A decoded texture image with raw RGBA8 pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Decode encoded image bytes (PNG, JPEG, ...) into an RGBA8 TextureAsset.
pub fn decode_texture(bytes: &[u8]) -> Result<TextureAsset, AssetError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AssetError::ImageDecodeFailed(e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureAsset {
        width,
        height,
        data: rgba.into_raw(),
    })
}

/// Decode every image of a description, position for position. Images that
/// are not stored in the binary payload or fail to decode become `None`.
pub fn load_images(
    description: &SceneDescription,
    resolver: &GeometryResolver<'_>,
) -> Vec<Option<TextureAsset>> {
    description
        .images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let bytes = resolver.view_bytes(image.buffer_view?)?;
            match decode_texture(bytes) {
                Ok(texture) => Some(texture),
                Err(e) => {
                    warn!("image {} unavailable: {}", i, e);
                    None
                }
            }
        })
        .collect()
}
