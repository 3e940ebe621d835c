//! JPEG output encoding

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};
use std::io::Cursor;

use super::error::ImageError;

/// Result of encoding an image
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Clamp a requested quality into the range the encoder accepts.
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(1, 100) as u8
}

/// Encode to baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(img: &DynamicImage, quality: i64) -> Result<EncodedImage, ImageError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, clamp_quality(quality));

    encoder
        .write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|e| ImageError::encode_failed(e.to_string()))?;

    Ok(EncodedImage {
        data: output.into_inner(),
        width,
        height,
    })
}
