use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds the viewer distinguishes. Per-image decode problems are
/// recovered (the entry is simply absent from the cache); the other kinds
/// end the session.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("no supported images found in {0}")]
    EmptyDirectory(PathBuf),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("could not allocate a {width}x{height} framebuffer")]
    Allocation { width: u32, height: u32 },
}
