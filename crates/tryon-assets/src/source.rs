use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AssetError;

/// Supplies the raw bytes of an accessory container by identifier.
pub trait AssetSource: Send + Sync {
    fn read(&self, id: &str) -> Result<Vec<u8>, AssetError>;

    /// Filesystem-style path an identifier refers to, used to pick the
    /// source format from its extension.
    fn locate(&self, id: &str) -> PathBuf {
        PathBuf::from(id)
    }
}

/// Reads accessories from a directory. Identifiers are paths relative to the
/// base directory; absolute identifiers bypass it.
pub struct DirectorySource {
    base_path: PathBuf,
}

impl DirectorySource {
    /// Create a new source rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("DirectorySource created with base path: {}", base_path.display());
        Self { base_path }
    }

    /// Resolve a relative asset path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// The base path this source resolves relative identifiers against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, id: &str) -> Result<Vec<u8>, AssetError> {
        let full_path = self.locate(id);
        if !full_path.exists() {
            return Err(AssetError::NotFound(full_path));
        }
        std::fs::read(&full_path).map_err(|e| AssetError::Io(full_path, e))
    }

    fn locate(&self, id: &str) -> PathBuf {
        self.resolve(Path::new(id))
    }
}
