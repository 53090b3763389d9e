//! Renderer error type.

use thiserror::Error;

/// Errors surfaced by the image-output layer.
///
/// Tracing itself is total (miss/hit booleans and sentinels, never errors);
/// only turning a finished frame into a file can fail.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image buffer of {width}x{height} pixels does not match its data")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}
