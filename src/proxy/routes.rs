//! Route table for the image service.

use crate::sizer::ParamsVariant;

/// What a request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ping,
    Health,
    Ready,
    Sizer(ParamsVariant),
    MethodNotAllowed,
    NotFound,
}

impl Route {
    /// Resolve `method` + `path` (no query string). Only GET is served.
    pub fn resolve(method: &str, path: &str) -> Self {
        let route = match path {
            "/ping" => Route::Ping,
            "/healthz" => Route::Health,
            "/readyz" => Route::Ready,
            "/resize.jpg" => Route::Sizer(ParamsVariant::Resize),
            "/crop.jpg" => Route::Sizer(ParamsVariant::Crop),
            "/v2/resize.jpg" => Route::Sizer(ParamsVariant::Combined),
            _ => return Route::NotFound,
        };

        if method != "GET" {
            return Route::MethodNotAllowed;
        }
        route
    }

    /// Label used in request logs
    pub fn name(&self) -> &'static str {
        match self {
            Route::Ping => "ping",
            Route::Health => "healthz",
            Route::Ready => "readyz",
            Route::Sizer(variant) => variant.as_str(),
            Route::MethodNotAllowed => "method_not_allowed",
            Route::NotFound => "not_found",
        }
    }

    /// Probes bypass the rate limiter
    pub fn is_rate_limited(&self) -> bool {
        !matches!(self, Route::Ping | Route::Health | Route::Ready)
    }
}
