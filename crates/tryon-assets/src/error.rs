use std::path::PathBuf;

/// Structural failures while reading a scene container. Any of these aborts
/// the whole load; no partial scene is produced.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid container header: {0}")]
    InvalidHeader(String),

    #[error("chunk at offset {offset} declares {declared} bytes but only {remaining} remain")]
    InvalidChunk {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("container has no structured scene chunk")]
    NoSceneChunk,

    #[error("malformed scene data: {0}")]
    MalformedSceneData(String),
}

/// Errors that can occur while fetching or decoding an accessory asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to decode '{0}': {1}")]
    Decode(String, #[source] DecodeError),

    #[error("failed to decode image: {0}")]
    ImageDecodeFailed(String),

    #[error("unsupported asset format in '{0}'")]
    UnsupportedFormat(PathBuf),
}
