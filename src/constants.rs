// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request timeout in seconds (bounds storage fetches)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

// =============================================================================
// Rate limit defaults
// =============================================================================

/// Default number of requests allowed per client within one window
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 300;

/// Default rate limit window in seconds
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

// =============================================================================
// Storage defaults
// =============================================================================

/// Default AWS region when neither config nor environment provides one
pub const DEFAULT_S3_REGION: &str = "eu-central-1";

// =============================================================================
// Image defaults
// =============================================================================

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: i64 = 70;

/// Default background color. Pure black means "no explicit background".
pub const DEFAULT_BACKGROUND: &str = "000000";

/// Default ceiling for source image width/height
pub const DEFAULT_MAX_INPUT_DIMENSION: i64 = 5000;

/// Default ceiling for output image width/height
pub const DEFAULT_MAX_OUTPUT_DIMENSION: i64 = 2000;

// =============================================================================
// Response headers
// =============================================================================

/// Cache-Control value sent with every generated image
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=2592000, immutable";

/// Content-Type of every generated image
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
