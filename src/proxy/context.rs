// Per-request context carried through the Pingora hooks

use std::time::Instant;
use uuid::Uuid;

use super::routes::Route;

/// Request context that holds all information about an HTTP request
/// between `request_filter` and `logging`
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    route: Route,
    started: Instant,
}

impl RequestContext {
    /// Automatically generates a unique request ID (UUID v4) and captures the start time
    pub fn new(method: String, path: String) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            route: Route::NotFound,
            started: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Record the request line once it is known
    pub fn set_request(&mut self, method: &str, path: &str, route: Route) {
        self.method = method.to_string();
        self.path = path.to_string();
        self.route = route;
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}
