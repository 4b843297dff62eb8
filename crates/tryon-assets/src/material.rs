//! Material resolution into renderer-ready parameters.

use tryon_core::Color;

use crate::description::{Material, Texture, TextureRef};
use crate::texture::TextureAsset;

/// Index into a scene graph's image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

/// Alpha cutoff used by `MASK` materials that do not declare one.
pub const DEFAULT_ALPHA_CUTOFF: f32 = 0.5;

/// How a material's alpha channel is composited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    Opaque,
    /// Opaque compositing; fragments below the cutoff are discarded.
    Mask { cutoff: f32 },
    /// Alpha-blended compositing.
    Blend,
}

/// A color slot fed either by a texture or a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSource {
    Texture(ImageId),
    Factor(Color),
}

/// A scalar slot fed either by a texture or a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarSource {
    Texture(ImageId),
    Factor(f32),
}

/// Physically-based material parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    pub name: Option<String>,
    pub base_color: ColorSource,
    pub metallic: ScalarSource,
    pub roughness: ScalarSource,
    pub normal: Option<ImageId>,
    pub emissive: Option<ImageId>,
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
}

impl MaterialParams {
    /// Grey material used by primitives without a valid material reference.
    pub const FALLBACK: MaterialParams = MaterialParams {
        name: None,
        base_color: ColorSource::Factor(Color::GREY),
        metallic: ScalarSource::Factor(0.0),
        roughness: ScalarSource::Factor(1.0),
        normal: None,
        emissive: None,
        alpha_mode: AlphaMode::Opaque,
        double_sided: false,
    };

    pub fn is_blended(&self) -> bool {
        self.alpha_mode == AlphaMode::Blend
    }
}

/// Follow `texture -> image` and return the image only if it decoded.
fn resolve_texture(
    reference: Option<&TextureRef>,
    textures: &[Texture],
    images: &[Option<TextureAsset>],
) -> Option<ImageId> {
    let texture = textures.get(reference?.index)?;
    let source = texture.source?;
    images.get(source)?.as_ref().map(|_| ImageId(source))
}

fn build_material(
    material: &Material,
    textures: &[Texture],
    images: &[Option<TextureAsset>],
) -> MaterialParams {
    let pbr = material.pbr_metallic_roughness.as_ref();

    let base_color = match resolve_texture(
        pbr.and_then(|p| p.base_color_texture.as_ref()),
        textures,
        images,
    ) {
        Some(image) => ColorSource::Texture(image),
        None => ColorSource::Factor(
            pbr.and_then(|p| p.base_color_factor)
                .map(Color::from_array)
                .unwrap_or(Color::WHITE),
        ),
    };

    let (metallic, roughness) = match resolve_texture(
        pbr.and_then(|p| p.metallic_roughness_texture.as_ref()),
        textures,
        images,
    ) {
        Some(image) => (ScalarSource::Texture(image), ScalarSource::Texture(image)),
        None => (
            ScalarSource::Factor(pbr.and_then(|p| p.metallic_factor).unwrap_or(1.0)),
            ScalarSource::Factor(pbr.and_then(|p| p.roughness_factor).unwrap_or(1.0)),
        ),
    };

    let alpha_mode = match material.alpha_mode.as_deref() {
        Some("BLEND") => AlphaMode::Blend,
        Some("MASK") => AlphaMode::Mask {
            cutoff: material.alpha_cutoff.unwrap_or(DEFAULT_ALPHA_CUTOFF),
        },
        _ => AlphaMode::Opaque,
    };

    let double_sided = material.double_sided == Some(true) || alpha_mode != AlphaMode::Opaque;

    MaterialParams {
        name: material.name.clone(),
        base_color,
        metallic,
        roughness,
        normal: resolve_texture(material.normal_texture.as_ref(), textures, images),
        emissive: resolve_texture(material.emissive_texture.as_ref(), textures, images),
        alpha_mode,
        double_sided,
    }
}

/// Resolve every material, one output per input, in order.
pub fn build_materials(
    materials: &[Material],
    textures: &[Texture],
    images: &[Option<TextureAsset>],
) -> Vec<MaterialParams> {
    materials
        .iter()
        .map(|m| build_material(m, textures, images))
        .collect()
}
