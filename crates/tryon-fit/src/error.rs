use thiserror::Error;
use tryon_assets::AssetError;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("accessory geometry has no horizontal extent")]
    DegenerateGeometry,

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Loader error: {0}")]
    Loader(String),
}
