//! Proxy utility functions.
//!
//! This module contains helper functions for request processing:
//! - Header extraction from Pingora requests
//! - Query parameter parsing
//! - Client identification (X-Forwarded-For aware)
//! - HTTP date formatting

use chrono::{DateTime, Utc};
use pingora_http::RequestHeader;
use pingora_proxy::Session;

use crate::sizer::QueryParams;

/// Header value as UTF-8, if present and valid.
pub fn header_str<'a>(req: &'a RequestHeader, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decoded query string of the request URI.
pub fn extract_query_params(req: &RequestHeader) -> QueryParams {
    QueryParams::parse(req.uri.query().unwrap_or(""))
}

/// Peer IP of the direct connection, without the port.
pub fn peer_ip(session: &Session) -> String {
    match session.client_addr() {
        Some(addr) => addr
            .as_inet()
            .map(|inet| inet.ip().to_string())
            .unwrap_or_else(|| addr.to_string()),
        None => "unknown".to_string(),
    }
}

/// Extract client IP address from session (X-Forwarded-For aware).
///
/// The header can contain multiple IPs: `"client, proxy1, proxy2"`.
/// The first IP is the original client, which is what we return.
pub fn get_client_ip(session: &Session) -> String {
    first_forwarded_for(header_str(session.req_header(), "x-forwarded-for"))
        .unwrap_or_else(|| peer_ip(session))
}

fn first_forwarded_for(forwarded_for: Option<&str>) -> Option<String> {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Key identifying one client for rate limiting.
///
/// The raw forwarded-for header is concatenated with the peer address, so
/// clients behind the same proxy stay distinct while direct clients are keyed
/// by their address alone.
pub fn rate_limit_key(forwarded_for: Option<&str>, peer_ip: &str) -> String {
    format!("{}{}", forwarded_for.unwrap_or(""), peer_ip)
}

/// IMF-fixdate as used by `Last-Modified` (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
