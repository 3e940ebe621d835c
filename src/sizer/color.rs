//! Hex color validation and decoding for background fills

use super::error::ImageError;

/// Pure black. Treated as "no explicit background" by the compositor.
pub const BLACK: &str = "000000";

fn strip_hash(color: &str) -> &str {
    color.strip_prefix('#').unwrap_or(color)
}

/// Returns true for a 6-digit hex color with an optional leading `#`.
pub fn is_valid_hex_color(color: &str) -> bool {
    let hex = strip_hash(color);
    hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns true when the color means "keep the raster as is".
///
/// Only the bare `000000` form qualifies; `#000000` is a real black fill.
pub fn is_black(color: &str) -> bool {
    color == BLACK
}

/// Decode a hex color into its RGB components.
pub fn parse_hex_color(color: &str) -> Result<[u8; 3], ImageError> {
    if !is_valid_hex_color(color) {
        return Err(ImageError::InvalidColor(color.to_string()));
    }

    let bytes =
        hex::decode(strip_hash(color)).map_err(|_| ImageError::InvalidColor(color.to_string()))?;

    Ok([bytes[0], bytes[1], bytes[2]])
}
