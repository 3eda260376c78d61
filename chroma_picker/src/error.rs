// THEORY:
// Every failure in the picker is non-fatal to the running session. The error
// types below exist so each layer can say *why* something did not happen, and so
// the session can decide how loudly to react:
//
// - `SampleError`  -> silent no-op (logged when access was denied).
// - `CameraError`  -> user-visible notice plus a fallback to upload mode.
// - `StorageError` -> logged; in-memory state stays authoritative.
// - `HexParseError`, `SurfaceError` -> returned to the caller that asked.

use std::path::PathBuf;
use thiserror::Error;

/// Why a pointer interaction did not produce a channel triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// The pointer maps outside the buffer (or the box/buffer has no area).
    #[error("sample coordinate out-of-bounds")]
    OutOfBounds,
    /// The surface has nothing drawn yet (no image, no camera frame).
    #[error("surface is not ready to be sampled")]
    NotReady,
    /// The host refused pixel access, e.g. a tainted cross-origin source.
    #[error("pixel access denied by the surface")]
    AccessDenied,
}

/// Why a camera stream could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    /// No device at all, or the requested device id does not exist.
    #[error("no camera device available")]
    NoDevice { requested: Option<String> },
    #[error("camera device is busy")]
    Busy,
    #[error("camera failure: {0}")]
    Other(String),
}

/// Durable storage failures. Never surfaced past the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage document is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex color {input:?}: expected six hex digits with an optional leading '#'")]
pub struct HexParseError {
    pub input: String,
}

/// Failure to turn an upload into a drawable canvas.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image or container has no area ({width}x{height})")]
    Empty { width: u32, height: u32 },
}
