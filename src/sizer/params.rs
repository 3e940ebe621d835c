//! Sizing parameter derivation
//!
//! Three query shapes are supported, one per route:
//!
//! ```text
//! /resize.jpg?src=...&width=800&height=600&density=2
//! /crop.jpg?src=...&x=10&y=10&width=100&height=100&scale=0.5
//! /v2/resize.jpg?src=...&width=800&height=600&crop[x]=100&crop[y]=100&crop[width]=400&crop[height]=300&crop[scale]=1.0
//! ```
//!
//! Derivation never fails: missing or unparsable values fall back to their
//! defaults. Whether the result is acceptable is decided later by
//! [`super::validation`].

use std::collections::HashMap;
use std::fmt;

/// Half-open integer rectangle `[min_x, min_y) - [max_x, max_y)`.
///
/// The all-zero default doubles as the "no crop" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Rectangle {
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle with its origin at `(x, y)` spanning `width × height`.
    pub fn from_origin(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// True when the caller actually asked for a crop.
    pub fn has_area(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Normalized parameters for one sizing request
#[derive(Debug, Clone, PartialEq)]
pub struct SizerParams {
    /// Output width, already multiplied by the density
    pub width: i64,
    /// Output height, already multiplied by the density
    pub height: i64,
    /// JPEG quality as requested (clamped only at encode time)
    pub quality: i64,
    /// Background color as a hex string
    pub background_color: String,
    /// Multiplier applied to the output dimensions
    pub density: f64,
    /// Multiplier the crop rectangle was divided by
    pub scale: f64,
    /// Crop rectangle in source coordinates
    pub crop: Rectangle,
}

impl fmt::Display for SizerParams {
    /// Canonical form used as part of the ETag input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}-q{}-bg{}-d{:.2}-s{:.2}-c{}",
            self.width,
            self.height,
            self.quality,
            self.background_color,
            self.density,
            self.scale,
            self.crop
        )
    }
}

/// Defaults used when the query does not carry `quality` or `background`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegDefaults {
    pub quality: i64,
    pub background: String,
}

impl Default for JpegDefaults {
    fn default() -> Self {
        Self {
            quality: crate::constants::DEFAULT_JPEG_QUALITY,
            background: crate::constants::DEFAULT_BACKGROUND.to_string(),
        }
    }
}

/// Decoded query string with typed, defaulting accessors
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// Keys and values are percent-decoded; the first occurrence of a key wins.
    pub fn parse(query: &str) -> Self {
        let mut params = HashMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params
                .entry(decode_component(key))
                .or_insert_with(|| decode_component(value));
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Integer value or `default` if missing or not an integer.
    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default)
    }

    /// Finite float value or `default` if missing or unparsable.
    pub fn float(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// String value or `default` if missing.
    pub fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = HashMap::new();
        for (key, value) in iter {
            params.entry(key.into()).or_insert_with(|| value.into());
        }
        Self { params }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Which query shape a route understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsVariant {
    /// `/resize.jpg`
    Resize,
    /// `/crop.jpg`
    Crop,
    /// `/v2/resize.jpg`
    Combined,
}

impl ParamsVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
            Self::Combined => "combined",
        }
    }

    pub fn derive(&self, query: &QueryParams, defaults: &JpegDefaults) -> SizerParams {
        match self {
            Self::Resize => derive_resize_params(query, defaults),
            Self::Crop => derive_crop_params(query, defaults),
            Self::Combined => derive_combined_params(query, defaults),
        }
    }
}

/// Any non-positive multiplier means "not given".
fn normalize_multiplier(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        1.0
    }
}

/// `density`, overridden by `scale` when both are present.
fn output_multiplier(query: &QueryParams) -> f64 {
    let density = query.float("density", 1.0);
    normalize_multiplier(query.float("scale", density))
}

fn scale_dimension(raw: i64, multiplier: f64) -> i64 {
    (raw as f64 * multiplier).round() as i64
}

fn unscale(value: i64, scale: f64) -> i64 {
    (value as f64 / scale) as i64
}

fn scaled_crop(x: i64, y: i64, width: i64, height: i64, scale: f64) -> Rectangle {
    Rectangle::from_origin(
        unscale(x, scale),
        unscale(y, scale),
        unscale(width, scale),
        unscale(height, scale),
    )
}

/// Plain resize: output multiplier from `scale` or `density`, no crop.
pub fn derive_resize_params(query: &QueryParams, defaults: &JpegDefaults) -> SizerParams {
    let density = output_multiplier(query);

    SizerParams {
        width: scale_dimension(query.int("width", 0), density),
        height: scale_dimension(query.int("height", 0), density),
        quality: query.int("quality", defaults.quality),
        background_color: query.string("background", &defaults.background),
        density,
        scale: 1.0,
        crop: Rectangle::default(),
    }
}

/// Crop-only: `width`/`height` describe both the crop zone (divided by
/// `scale`) and the output size (multiplied by `density`).
pub fn derive_crop_params(query: &QueryParams, defaults: &JpegDefaults) -> SizerParams {
    let w = query.int("width", 0);
    let h = query.int("height", 0);
    let x = query.int("x", 0);
    let y = query.int("y", 0);

    let density = normalize_multiplier(query.float("density", 1.0));
    let scale = normalize_multiplier(query.float("scale", 1.0));

    SizerParams {
        width: scale_dimension(w, density),
        height: scale_dimension(h, density),
        quality: query.int("quality", defaults.quality),
        background_color: query.string("background", &defaults.background),
        density,
        scale,
        crop: scaled_crop(x, y, w, h, scale),
    }
}

/// Resize plus an optional nested `crop[...]` zone with its own scale.
pub fn derive_combined_params(query: &QueryParams, defaults: &JpegDefaults) -> SizerParams {
    let density = output_multiplier(query);
    let crop_scale = normalize_multiplier(query.float("crop[scale]", 1.0));

    let crop = scaled_crop(
        query.int("crop[x]", 0),
        query.int("crop[y]", 0),
        query.int("crop[width]", 0),
        query.int("crop[height]", 0),
        crop_scale,
    );

    SizerParams {
        width: scale_dimension(query.int("width", 0), density),
        height: scale_dimension(query.int("height", 0), density),
        quality: query.int("quality", defaults.quality),
        background_color: query.string("background", &defaults.background),
        density,
        scale: crop_scale,
        crop,
    }
}
