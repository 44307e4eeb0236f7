use std::path::PathBuf;

use thiserror::Error;

use crate::types::Rect;

/// Problems with the recognizer configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that abort startup before any sampling tick is scheduled.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("reference template {path:?} could not be read: {source}")]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("reference template produced no features")]
    EmptyTemplate,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Per-tick failures. The tick is skipped and the loop carries on.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera is not producing frames yet")]
    NotReady,

    #[error("region of interest {roi} exceeds the {width}x{height} frame")]
    RoiOutOfBounds { roi: Rect, width: u32, height: u32 },

    #[error("camera stream ended")]
    StreamEnded,

    #[error("frame capture failed: {0}")]
    Device(String),
}

/// Failures acquiring the camera stream.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),

    #[error("no camera available: {0}")]
    NoDevice(String),

    #[error("camera io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode frame {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay asset {0:?} not found")]
    MissingAsset(PathBuf),

    #[error("asset catalog is empty")]
    EmptyCatalog,

    #[error("invalid asset weights: {0}")]
    InvalidWeights(String),

    #[error("failed to read asset catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse asset catalog: {0}")]
    Json(#[from] serde_json::Error),
}
