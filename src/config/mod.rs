// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod image;
mod rate_limit;
mod server;
mod storage;

pub use image::{JpegConfig, SourceConfig};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

use crate::constants::{DEFAULT_MAX_INPUT_DIMENSION, DEFAULT_MAX_OUTPUT_DIMENSION};
use crate::sizer::{is_valid_hex_color, Dimension, DimensionPolicy, JpegDefaults};
use crate::source::SourceResolver;

fn default_max_input_dimension() -> i64 {
    DEFAULT_MAX_INPUT_DIMENSION
}

fn default_max_output_dimension() -> i64 {
    DEFAULT_MAX_OUTPUT_DIMENSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub allowed_sources: Vec<SourceConfig>,
    #[serde(default)]
    pub allowed_dimensions: Vec<Dimension>,
    /// Skip the allow-list check (size ceilings still apply)
    #[serde(default)]
    pub allow_all_dimensions: bool,
    #[serde(default = "default_max_input_dimension")]
    pub max_input_dimension: i64,
    #[serde(default = "default_max_output_dimension")]
    pub max_output_dimension: i64,
    #[serde(default)]
    pub jpeg: JpegConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            storage: StorageConfig::default(),
            allowed_sources: Vec::new(),
            allowed_dimensions: Vec::new(),
            allow_all_dimensions: false,
            max_input_dimension: default_max_input_dimension(),
            max_output_dimension: default_max_output_dimension(),
            jpeg: JpegConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Read, parse and validate in one step.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.threads == 0 {
            return Err("Server threads must be at least 1".to_string());
        }

        if self.max_input_dimension <= 0 {
            return Err(format!(
                "max_input_dimension must be positive, got {}",
                self.max_input_dimension
            ));
        }

        if self.max_output_dimension <= 0 {
            return Err(format!(
                "max_output_dimension must be positive, got {}",
                self.max_output_dimension
            ));
        }

        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(format!(
                "jpeg.quality must be between 1 and 100, got {}",
                self.jpeg.quality
            ));
        }

        if !is_valid_hex_color(&self.jpeg.background) {
            return Err(format!(
                "jpeg.background '{}' is not a 6-digit hex color",
                self.jpeg.background
            ));
        }

        for dim in &self.allowed_dimensions {
            if dim.width < 0 || dim.height < 0 {
                return Err(format!(
                    "allowed dimension {}x{} cannot be negative",
                    dim.width, dim.height
                ));
            }
        }

        if self.rate_limit.enabled {
            if self.rate_limit.max_requests == 0 {
                return Err("rate_limit.max_requests must be positive".to_string());
            }
            if self.rate_limit.window_seconds == 0 {
                return Err("rate_limit.window_seconds must be positive".to_string());
            }
        }

        if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
            return Err(
                "storage.access_key and storage.secret_key must be set together".to_string(),
            );
        }

        // Compiles every pattern and matcher
        self.source_resolver().map(|_| ())
    }

    pub fn dimension_policy(&self) -> DimensionPolicy {
        DimensionPolicy::new(
            self.allowed_dimensions.clone(),
            self.allow_all_dimensions,
            self.max_input_dimension,
            self.max_output_dimension,
        )
    }

    pub fn source_resolver(&self) -> Result<SourceResolver, String> {
        SourceResolver::from_configs(&self.allowed_sources)
    }

    pub fn jpeg_defaults(&self) -> JpegDefaults {
        self.jpeg.to_defaults()
    }

    pub fn request_timeout(&self) -> Duration {
        self.server.request_timeout()
    }
}
