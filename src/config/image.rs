//! Image and source configuration types.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BACKGROUND, DEFAULT_JPEG_QUALITY};
use crate::sizer::JpegDefaults;

/// One `allowed_sources` entry as written in YAML
///
/// `pattern` is a host glob; `matcher` (if set) is a full-URL regex with two
/// capture groups for bucket and key. Without a matcher, `bucket` names the
/// bucket to read from, and an empty or missing bucket means "fetch over HTTP".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    #[serde(default)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

fn default_quality() -> i64 {
    DEFAULT_JPEG_QUALITY
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// JPEG output defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JpegConfig {
    #[serde(default = "default_quality")]
    pub quality: i64,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            background: default_background(),
        }
    }
}

impl JpegConfig {
    pub fn to_defaults(&self) -> JpegDefaults {
        JpegDefaults {
            quality: self.quality,
            background: self.background.clone(),
        }
    }
}
