//! Dimension and crop-zone policy
//!
//! Provides:
//! - Allow-list check for requested output dimensions
//! - Input/output size ceilings (image bomb protection)
//! - Crop rectangle bounds check against the decoded source

use serde::{Deserialize, Serialize};

use super::params::Rectangle;
use crate::error::{RejectReason, SizerError};

/// One allow-listed `width × height` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: i64,
    pub height: i64,
}

impl Dimension {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }
}

/// Which output sizes may be requested and how large images may get
#[derive(Debug, Clone)]
pub struct DimensionPolicy {
    allowed: Vec<Dimension>,
    allow_all: bool,
    max_input_dimension: i64,
    max_output_dimension: i64,
}

impl DimensionPolicy {
    pub fn new(
        allowed: Vec<Dimension>,
        allow_all: bool,
        max_input_dimension: i64,
        max_output_dimension: i64,
    ) -> Self {
        Self {
            allowed,
            allow_all,
            max_input_dimension,
            max_output_dimension,
        }
    }

    /// Whether `width × height` matches an allow-list entry.
    ///
    /// A zero on either axis matches any entry value on that axis.
    pub fn is_allowed_dimension(&self, width: i64, height: i64) -> bool {
        if self.allow_all {
            tracing::warn!(width, height, "unknown dimension");
            return true;
        }

        self.allowed.iter().any(|dim| {
            (width == 0 || dim.width == width) && (height == 0 || dim.height == height)
        })
    }

    /// Reject decoded sources larger than the input ceiling on either axis.
    pub fn validate_input_dimensions(&self, width: i64, height: i64) -> Result<(), SizerError> {
        if width > self.max_input_dimension || height > self.max_input_dimension {
            return Err(RejectReason::InputDimensionsExceeded.into());
        }
        Ok(())
    }

    /// Reject requested outputs larger than the output ceiling on either axis.
    pub fn validate_output_dimensions(&self, width: i64, height: i64) -> Result<(), SizerError> {
        if width > self.max_output_dimension || height > self.max_output_dimension {
            return Err(RejectReason::OutputDimensionsExceeded.into());
        }
        Ok(())
    }

    pub fn max_input_dimension(&self) -> i64 {
        self.max_input_dimension
    }

    pub fn max_output_dimension(&self) -> i64 {
        self.max_output_dimension
    }
}

/// Check that `crop` lies inside a `source_width × source_height` raster.
pub fn validate_crop_zone(
    source_width: i64,
    source_height: i64,
    crop: &Rectangle,
) -> Result<(), SizerError> {
    if crop.min_x < 0
        || crop.min_y < 0
        || crop.max_x > source_width
        || crop.max_y > source_height
        || crop.is_empty()
    {
        return Err(RejectReason::InvalidCropZone.into());
    }
    Ok(())
}
