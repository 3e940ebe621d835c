//! Image pipeline error types

/// Errors that can occur while decoding, transforming or encoding an image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// Source bytes could not be decoded into a raster
    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    /// Resize operation failed
    #[error("Resize failed: {0}")]
    ResizeFailed(String),

    /// Background color is not a 6-digit hex color
    #[error("Invalid hex color: {0}")]
    InvalidColor(String),

    /// Encoding to JPEG failed
    #[error("Failed to encode to jpeg: {0}")]
    EncodeFailed(String),
}

impl ImageError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed(message.into())
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed(message.into())
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        ImageError::EncodeFailed(message.into())
    }
}
