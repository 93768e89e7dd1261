//! Image error types

use thiserror::Error;

/// Errors raised while loading or decoding frame images
#[derive(Error, Debug)]
pub enum ImageError {
    /// The loader does not know the frame
    #[error("Frame not found: {0}")]
    NotFound(String),

    /// Failed to read the frame's backing file
    #[error("Failed to load frame: {0}")]
    FileLoad(String),

    /// Pixel data was malformed
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// Decoder error from the `image` crate
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
