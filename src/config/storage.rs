//! Object storage configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_S3_REGION;

/// Region from `AWS_REGION` when set, otherwise the built-in default
fn default_region() -> String {
    std::env::var("AWS_REGION")
        .ok()
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_S3_REGION.to_string())
}

/// S3 client settings
///
/// Credentials are optional; when either key is missing the default AWS
/// provider chain (environment, profile, instance metadata) is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint override (MinIO, LocalStack)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: false,
        }
    }
}

impl StorageConfig {
    pub fn has_static_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}
