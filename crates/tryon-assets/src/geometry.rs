//! Accessor resolution: turns accessor -> buffer view -> byte range chains
//! into concrete vertex attribute arrays and index lists.

use bytemuck::Pod;
use tracing::debug;

use crate::description::{
    Accessor, ComponentType, ElementShape, Primitive, SceneDescription, ATTRIBUTE_NORMAL,
    ATTRIBUTE_POSITION, ATTRIBUTE_TEXCOORD_0,
};

/// Raw component values of one attribute, kept in their stored encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

/// A resolved vertex attribute: `count` elements of `shape.components()`
/// components each, stored flat.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub shape: ElementShape,
    pub count: usize,
    pub data: ComponentData,
}

impl VertexAttribute {
    pub fn component_type(&self) -> ComponentType {
        match self.data {
            ComponentData::I8(_) => ComponentType::I8,
            ComponentData::U8(_) => ComponentType::U8,
            ComponentData::I16(_) => ComponentType::I16,
            ComponentData::U16(_) => ComponentType::U16,
            ComponentData::U32(_) => ComponentType::U32,
            ComponentData::F32(_) => ComponentType::F32,
        }
    }

    /// The attribute as float triples, if it is a float `VEC3`.
    pub fn as_vec3(&self) -> Option<&[[f32; 3]]> {
        match (&self.data, self.shape) {
            (ComponentData::F32(values), ElementShape::Vec3) => {
                bytemuck::try_cast_slice(values.as_slice()).ok()
            }
            _ => None,
        }
    }

    /// The attribute as float pairs, if it is a float `VEC2`.
    pub fn as_vec2(&self) -> Option<&[[f32; 2]]> {
        match (&self.data, self.shape) {
            (ComponentData::F32(values), ElementShape::Vec2) => {
                bytemuck::try_cast_slice(values.as_slice()).ok()
            }
            _ => None,
        }
    }
}

/// Index list of a primitive. Width follows the index accessor's component type.
#[derive(Debug, Clone, PartialEq)]
pub enum Indices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    /// Sequential triangle list over `vertex_count` vertices. A trailing
    /// partial triangle is dropped.
    pub fn sequential(vertex_count: usize) -> Self {
        let used = (vertex_count - vertex_count % 3) as u32;
        Indices::U32((0..used).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Indices::U8(v) => v.len(),
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per index.
    pub fn width(&self) -> usize {
        match self {
            Indices::U8(_) => 1,
            Indices::U16(_) => 2,
            Indices::U32(_) => 4,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.len() / 3
    }

    /// Indices of complete triangles widened to `u32`.
    pub fn triangles_u32(&self) -> Vec<u32> {
        let n = self.triangle_count() * 3;
        match self {
            Indices::U8(v) => v[..n].iter().map(|&i| u32::from(i)).collect(),
            Indices::U16(v) => v[..n].iter().map(|&i| u32::from(i)).collect(),
            Indices::U32(v) => v[..n].to_vec(),
        }
    }
}

/// Geometry of a single mesh primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveGeometry {
    pub positions: VertexAttribute,
    pub normals: Option<VertexAttribute>,
    pub tex_coords: Option<VertexAttribute>,
    pub indices: Indices,
}

impl PrimitiveGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.count
    }
}

/// Little-endian component read from an unaligned byte slice.
trait LeComponent: Pod {
    fn from_le(self) -> Self;
}

macro_rules! le_int {
    ($($t:ty),*) => {$(
        impl LeComponent for $t {
            fn from_le(self) -> Self {
                <$t>::from_le(self)
            }
        }
    )*};
}

le_int!(i8, u8, i16, u16, u32);

impl LeComponent for f32 {
    fn from_le(self) -> Self {
        f32::from_bits(u32::from_le(self.to_bits()))
    }
}

fn read_components<T: LeComponent>(
    bytes: &[u8],
    count: usize,
    components: usize,
    stride: usize,
) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    let mut out = Vec::with_capacity(count * components);
    for element in 0..count {
        let base = element * stride;
        for c in 0..components {
            let at = base + c * size;
            out.push(bytemuck::pod_read_unaligned::<T>(&bytes[at..at + size]).from_le());
        }
    }
    out
}

/// Resolves accessors of one scene description against its binary payload.
pub struct GeometryResolver<'a> {
    description: &'a SceneDescription,
    payload: Option<&'a [u8]>,
}

impl<'a> GeometryResolver<'a> {
    pub fn new(description: &'a SceneDescription, payload: Option<&'a [u8]>) -> Self {
        Self {
            description,
            payload,
        }
    }

    /// Bytes of a buffer view, if the view exists, is backed by the binary
    /// payload, and lies inside it.
    pub fn view_bytes(&self, view_index: usize) -> Option<&'a [u8]> {
        let view = self.description.buffer_views.get(view_index)?;
        if let Some(buffer) = self.description.buffers.get(view.buffer) {
            if buffer.uri.is_some() {
                return None;
            }
        }
        let payload = self.payload?;
        let end = view.byte_offset.checked_add(view.byte_length)?;
        payload.get(view.byte_offset..end)
    }

    /// Byte window and element stride of an accessor.
    fn accessor_window(
        &self,
        accessor: &Accessor,
        ty: ComponentType,
        shape: ElementShape,
    ) -> Option<(&'a [u8], usize)> {
        let view_index = accessor.buffer_view?;
        let view = self.description.buffer_views.get(view_index)?;
        let bytes = self.view_bytes(view_index)?;

        let element_size = ty.size() * shape.components();
        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return None;
        }

        let needed = match accessor.count {
            0 => 0,
            n => (n - 1).checked_mul(stride)?.checked_add(element_size)?,
        };
        let end = accessor.byte_offset.checked_add(needed)?;
        let window = bytes.get(accessor.byte_offset..end)?;
        Some((window, stride))
    }

    /// Read an accessor in its stored encoding.
    pub fn read_attribute(&self, accessor_index: usize) -> Option<VertexAttribute> {
        let accessor = self.description.accessors.get(accessor_index)?;
        let ty = accessor.component_type()?;
        let shape = accessor.element_shape()?;
        let (bytes, stride) = self.accessor_window(accessor, ty, shape)?;

        let (count, n) = (accessor.count, shape.components());
        let data = match ty {
            ComponentType::I8 => ComponentData::I8(read_components(bytes, count, n, stride)),
            ComponentType::U8 => ComponentData::U8(read_components(bytes, count, n, stride)),
            ComponentType::I16 => ComponentData::I16(read_components(bytes, count, n, stride)),
            ComponentType::U16 => ComponentData::U16(read_components(bytes, count, n, stride)),
            ComponentType::U32 => ComponentData::U32(read_components(bytes, count, n, stride)),
            ComponentType::F32 => ComponentData::F32(read_components(bytes, count, n, stride)),
        };

        Some(VertexAttribute { shape, count, data })
    }

    /// Read an index accessor. Only unsigned scalar types are accepted.
    pub fn read_indices(&self, accessor_index: usize) -> Option<Indices> {
        let accessor = self.description.accessors.get(accessor_index)?;
        let shape = accessor.element_shape()?;
        if shape != ElementShape::Scalar {
            return None;
        }
        let ty = accessor.component_type()?;
        let (bytes, stride) = self.accessor_window(accessor, ty, shape)?;
        let count = accessor.count;

        match ty {
            ComponentType::U8 => Some(Indices::U8(read_components(bytes, count, 1, stride))),
            ComponentType::U16 => Some(Indices::U16(read_components(bytes, count, 1, stride))),
            ComponentType::U32 => Some(Indices::U32(read_components(bytes, count, 1, stride))),
            _ => None,
        }
    }

    /// Build the geometry of one primitive.
    ///
    /// Returns `None` when `POSITION` is missing or unreadable, or when the
    /// primitive names an index accessor whose data cannot be read. Optional
    /// attributes that fail to resolve, or whose element count differs from
    /// the positions, are left out.
    pub fn build_primitive_geometry(&self, primitive: &Primitive) -> Option<PrimitiveGeometry> {
        let Some(&position_index) = primitive.attributes.get(ATTRIBUTE_POSITION) else {
            debug!("primitive has no POSITION attribute");
            return None;
        };
        let Some(positions) = self.read_attribute(position_index) else {
            debug!("POSITION accessor {} could not be resolved", position_index);
            return None;
        };

        let optional = |semantic: &str| {
            let index = *primitive.attributes.get(semantic)?;
            let attribute = self.read_attribute(index)?;
            if attribute.count != positions.count {
                debug!(
                    "{} has {} elements, expected {}",
                    semantic, attribute.count, positions.count
                );
                return None;
            }
            Some(attribute)
        };
        let normals = optional(ATTRIBUTE_NORMAL);
        let tex_coords = optional(ATTRIBUTE_TEXCOORD_0);

        let indices = match primitive.indices {
            Some(index) if index < self.description.accessors.len() => {
                let Some(indices) = self.read_indices(index) else {
                    debug!("index accessor {} could not be resolved", index);
                    return None;
                };
                indices
            }
            _ => Indices::sequential(positions.count),
        };

        Some(PrimitiveGeometry {
            positions,
            normals,
            tex_coords,
            indices,
        })
    }
}
