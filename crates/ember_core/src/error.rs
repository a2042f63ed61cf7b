//! Scene construction errors.

use ember_math::Vec3;
use thiserror::Error;

/// Errors raised while building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Degenerate triangle ({v0}, {v1}, {v2})")]
    DegenerateTriangle { v0: Vec3, v1: Vec3, v2: Vec3 },

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Zero-length {0} vector")]
    ZeroVector(&'static str),

    #[error("Image error: {0}")]
    Image(#[from] crate::texture::ImageError),
}

/// Result type for scene construction.
pub type SceneResult<T> = Result<T, SceneError>;
