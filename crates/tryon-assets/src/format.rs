use std::path::Path;

use glam::{Mat4, Quat};

use crate::container::CONTAINER_MAGIC;

/// Container flavour of an accessory file, chosen from its extension at load
/// time. Each flavour carries the correction applied above its scene roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Binary scene container; already in the tracking space's orientation.
    Glb,
    /// USD archive; exported lying on its back and upside down.
    Usdz,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(Self::Glb),
            "usdz" => Some(Self::Usdz),
            _ => None,
        }
    }

    /// Recognize a binary container by its leading magic, for ids that carry
    /// no usable extension.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4) {
            Some(head) if head == CONTAINER_MAGIC.to_le_bytes() => Some(Self::Glb),
            _ => None,
        }
    }

    /// Rotation applied above the scene roots before measurement and placement.
    pub fn correction(self) -> Mat4 {
        match self {
            Self::Glb => Mat4::IDENTITY,
            // 180 degree axis fix plus a 90 degree tilt.
            Self::Usdz => Mat4::from_quat(Quat::from_rotation_x(std::f32::consts::PI * 1.5)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(SourceFormat::from_path(Path::new("wigs/Bob.GLB")), Some(SourceFormat::Glb));
        assert_eq!(SourceFormat::from_path(Path::new("afro.usdz")), Some(SourceFormat::Usdz));
        assert_eq!(SourceFormat::from_path(Path::new("afro.dae")), None);
        assert_eq!(SourceFormat::from_path(Path::new("afro")), None);
    }

    #[test]
    fn magic_identifies_binary_container() {
        assert_eq!(SourceFormat::from_magic(b"glTF\x02\0\0\0"), Some(SourceFormat::Glb));
        assert_eq!(SourceFormat::from_magic(b"PK\x03\x04"), None);
        assert_eq!(SourceFormat::from_magic(b"gl"), None);
    }

    #[test]
    fn usdz_correction_turns_z_up_into_y_up() {
        let up = SourceFormat::Usdz.correction().transform_vector3(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(SourceFormat::Glb.correction(), Mat4::IDENTITY);
    }
}
