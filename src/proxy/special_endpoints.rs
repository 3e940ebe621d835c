//! Special endpoint handlers for the proxy.
//!
//! This module provides response generators for built-in endpoints:
//! - `/ping` - Liveness, empty body
//! - `/healthz` - Health with object store status
//! - `/readyz` - Readiness, 503 while the object store is unreachable
//!
//! plus the JSON error bodies shared by every route.
//!
//! # Design
//!
//! Functions return `EndpointResponse` instead of writing directly to session.
//! The caller handles writing the response to the session.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::SizerError;
use crate::storage::StorageError;

/// Response from a special endpoint handler.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a JSON response with the given status and body.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// `{"error": reason}` with the given status.
    pub fn error(status: u16, reason: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": reason }).to_string())
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

impl From<&SizerError> for EndpointResponse {
    fn from(err: &SizerError) -> Self {
        Self::json(err.to_http_status(), err.to_json_body())
    }
}

/// Generate response for /ping endpoint.
pub fn handle_ping() -> EndpointResponse {
    EndpointResponse::empty(200)
}

/// Status body shared by the health and readiness probes.
fn status_body(
    check: &Result<(), StorageError>,
    ok: &str,
    not_ok: &str,
    now: DateTime<Utc>,
) -> String {
    let (status, s3_status) = match check {
        Ok(()) => (ok, "connected".to_string()),
        Err(e) => (not_ok, format!("error: {e}")),
    };

    serde_json::json!({
        "status": status,
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Secs, true),
        "s3_status": s3_status,
    })
    .to_string()
}

/// Generate response for /healthz endpoint. Always 200.
pub fn handle_health(check: &Result<(), StorageError>, now: DateTime<Utc>) -> EndpointResponse {
    EndpointResponse::json(200, status_body(check, "healthy", "unhealthy", now))
}

/// Generate response for /readyz endpoint.
pub fn handle_ready(check: &Result<(), StorageError>, now: DateTime<Utc>) -> EndpointResponse {
    let status = if check.is_ok() { 200 } else { 503 };
    EndpointResponse::json(status, status_body(check, "ready", "not_ready", now))
}

pub fn handle_not_found() -> EndpointResponse {
    EndpointResponse::error(404, "not found")
}

pub fn handle_method_not_allowed() -> EndpointResponse {
    EndpointResponse::error(405, "method not allowed")
}

pub fn handle_rate_limited() -> EndpointResponse {
    EndpointResponse::error(429, "rate limit exceeded")
}
