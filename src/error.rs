use std::path::PathBuf;

/// Failures at the I/O edges of the inspector. Interaction and rendering
/// never produce these; they degrade instead.
#[derive(thiserror::Error, Debug)]
pub enum InspectorError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed detection result")]
    ResultDecode(#[source] serde_json::Error),

    #[error("malformed config file {path}")]
    ConfigDecode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("image decode failed")]
    ImageDecode(#[source] image::ImageError),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("export serialization failed")]
    Export(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InspectorError>;
