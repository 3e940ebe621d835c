//! Image processing implementation
//!
//! Handles the actual image transformation in a fixed order:
//! decode → crop → resize/fill → background composite

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

use super::color::{is_black, parse_hex_color};
use super::error::ImageError;
use super::params::{Rectangle, SizerParams};

/// Decode image data into a DynamicImage
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

/// Run crop, resize/fill and background composite on a decoded raster.
///
/// `crop` must already have passed [`super::validation::validate_crop_zone`].
pub fn transform_image(
    img: DynamicImage,
    crop: Option<&Rectangle>,
    params: &SizerParams,
) -> Result<DynamicImage, ImageError> {
    let img = match crop {
        Some(zone) => crop_image(&img, zone),
        None => img,
    };
    let img = resize_image(img, params.width, params.height)?;
    fill_background(img, &params.background_color)
}

/// Cut `zone` out of the raster.
pub fn crop_image(img: &DynamicImage, zone: &Rectangle) -> DynamicImage {
    img.crop_imm(
        zone.min_x.max(0) as u32,
        zone.min_y.max(0) as u32,
        zone.width().max(0) as u32,
        zone.height().max(0) as u32,
    )
}

/// Resize to the requested output size.
///
/// - both axes positive: fill exactly, cropping the overflow around the center
/// - one axis positive: match that axis, keep the aspect ratio
/// - neither: unchanged
pub fn resize_image(img: DynamicImage, width: i64, height: i64) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = img.dimensions();
    let (target_w, target_h) = output_dimensions(src_w, src_h, width, height);

    match (width > 0, height > 0) {
        (true, true) => fill_image(&img, target_w, target_h),
        (true, false) | (false, true) => resize_exact(&img, target_w, target_h),
        (false, false) => Ok(img),
    }
}

/// Final raster size for a `src_w × src_h` input and the requested axes.
///
/// A single requested axis derives the other from the aspect ratio.
pub fn output_dimensions(src_w: u32, src_h: u32, width: i64, height: i64) -> (u32, u32) {
    match (width > 0, height > 0) {
        (true, true) => (clamp_u32(width), clamp_u32(height)),
        (true, false) => {
            let target_w = clamp_u32(width);
            (target_w, proportional(src_h, target_w, src_w))
        }
        (false, true) => {
            let target_h = clamp_u32(height);
            (proportional(src_w, target_h, src_h), target_h)
        }
        (false, false) => (src_w, src_h),
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// `other * target / axis`, rounded and never below one pixel.
fn proportional(other: u32, target: u32, axis: u32) -> u32 {
    let value = (other as f64 * target as f64 / axis as f64).round();
    value.clamp(1.0, u32::MAX as f64) as u32
}

/// Scale to cover `dst_w × dst_h`, then cut the centered excess.
fn fill_image(img: &DynamicImage, dst_w: u32, dst_h: u32) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ImageError::resize_failed("Source image is empty"));
    }

    let scale = f64::max(dst_w as f64 / src_w as f64, dst_h as f64 / src_h as f64);
    let crop_w = ((dst_w as f64 / scale).round() as u32).clamp(1, src_w);
    let crop_h = ((dst_h as f64 / scale).round() as u32).clamp(1, src_h);

    let cropped = if crop_w == src_w && crop_h == src_h {
        img.clone()
    } else {
        img.crop_imm((src_w - crop_w) / 2, (src_h - crop_h) / 2, crop_w, crop_h)
    };

    resize_exact(&cropped, dst_w, dst_h)
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_exact(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let src_w = img.width();
    let src_h = img.height();

    if src_w == target_w && src_h == target_h {
        return Ok(img.clone());
    }

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}

/// Flatten the raster onto an opaque canvas of `color`.
///
/// Black leaves the raster untouched, alpha included.
pub fn fill_background(img: DynamicImage, color: &str) -> Result<DynamicImage, ImageError> {
    if is_black(color) {
        return Ok(img);
    }

    let [r, g, b] = parse_hex_color(color)?;
    let source = img.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(source.width(), source.height(), Rgba([r, g, b, 255]));

    overlay_center(&mut canvas, &source);

    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Blend `source` over the middle of `canvas`.
fn overlay_center(canvas: &mut RgbaImage, source: &RgbaImage) {
    let offset_x = (canvas.width() as i64 - source.width() as i64) / 2;
    let offset_y = (canvas.height() as i64 - source.height() as i64) / 2;

    for (sx, sy, fg) in source.enumerate_pixels() {
        let tx = sx as i64 + offset_x;
        let ty = sy as i64 + offset_y;
        if tx < 0 || ty < 0 || tx >= canvas.width() as i64 || ty >= canvas.height() as i64 {
            continue;
        }

        let bg = canvas.get_pixel(tx as u32, ty as u32);
        let blended = blend_pixels(*bg, *fg);
        canvas.put_pixel(tx as u32, ty as u32, blended);
    }
}

/// Blend two pixels using the Porter-Duff "over" operator
///
/// result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
