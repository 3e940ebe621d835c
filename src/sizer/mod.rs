//! Image sizing core
//!
//! Request parameters in, JPEG bytes out:
//!
//! ```text
//! QueryParams → SizerParams → validation → decode → crop → resize/fill
//!             → background → encode → ETag
//! ```
//!
//! Everything in here is synchronous and free of I/O; fetching the source
//! belongs to [`crate::storage`] and request orchestration to
//! [`crate::service`].

pub mod color;
pub mod encoder;
pub mod error;
pub mod etag;
pub mod params;
pub mod processor;
pub mod validation;

pub use color::{is_black, is_valid_hex_color, parse_hex_color};
pub use encoder::{encode_jpeg, EncodedImage};
pub use error::ImageError;
pub use etag::calculate_etag;
pub use params::{JpegDefaults, ParamsVariant, QueryParams, Rectangle, SizerParams};
pub use processor::{decode_image, output_dimensions, transform_image};
pub use validation::{validate_crop_zone, Dimension, DimensionPolicy};
