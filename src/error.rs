// Error types module

use crate::sizer::ImageError;
use crate::storage::StorageError;

/// Machine-readable reason attached to a rejected request.
///
/// The string form is what callers see in the `error` field of the JSON body,
/// so the wording is part of the response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidDimensions,
    OutputDimensionsExceeded,
    SourceRequired,
    InvalidSource,
    InputDimensionsExceeded,
    InvalidCropZone,
    InvalidBackgroundColor,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidDimensions => "invalid dimensions",
            RejectReason::OutputDimensionsExceeded => "requested output dimensions exceed limit",
            RejectReason::SourceRequired => "source URL is required",
            RejectReason::InvalidSource => "invalid source URL",
            RejectReason::InputDimensionsExceeded => "image dimensions exceed limit",
            RejectReason::InvalidCropZone => "invalid crop zone",
            RejectReason::InvalidBackgroundColor => "invalid background color",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Centralized error type for a single sizing request
///
/// Every variant is terminal for the request: nothing is retried and no
/// partial body is ever written.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SizerError {
    /// The caller asked for something we refuse to produce
    #[error("invalid request: {0}")]
    InvalidRequest(RejectReason),

    /// Fetching or decoding the source image failed
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Encoding the output failed
    #[error("encode failure: {0}")]
    EncodeFailure(String),
}

impl SizerError {
    /// Maps errors to HTTP status codes
    ///
    /// - InvalidRequest → 400
    /// - SourceUnavailable, EncodeFailure → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            SizerError::InvalidRequest(_) => 400,
            SizerError::SourceUnavailable(_) | SizerError::EncodeFailure(_) => 500,
        }
    }

    /// Reason string for the response body.
    ///
    /// Processing failures are collapsed into one generic reason so backend
    /// details never leak to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            SizerError::InvalidRequest(reason) => reason.as_str(),
            SizerError::SourceUnavailable(_) | SizerError::EncodeFailure(_) => {
                "error processing image"
            }
        }
    }

    /// JSON body sent for this error
    pub fn to_json_body(&self) -> String {
        serde_json::json!({ "error": self.reason() }).to_string()
    }
}

impl From<RejectReason> for SizerError {
    fn from(reason: RejectReason) -> Self {
        SizerError::InvalidRequest(reason)
    }
}

impl From<StorageError> for SizerError {
    fn from(err: StorageError) -> Self {
        SizerError::SourceUnavailable(err.to_string())
    }
}

impl From<ImageError> for SizerError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::DecodeFailed(msg) => SizerError::SourceUnavailable(msg),
            ImageError::InvalidColor(_) => {
                SizerError::InvalidRequest(RejectReason::InvalidBackgroundColor)
            }
            ImageError::ResizeFailed(msg) | ImageError::EncodeFailed(msg) => {
                SizerError::EncodeFailure(msg)
            }
        }
    }
}
