// Proxy module - Pingora ProxyHttp implementation
// Every request is answered locally in request_filter; nothing is proxied upstream.

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod context;
pub mod helpers;
pub mod routes;
pub mod special_endpoints;

use crate::constants::{IMAGE_CACHE_CONTROL, IMAGE_CONTENT_TYPE};
use crate::rate_limit::RateLimitManager;
use crate::service::{SizerResponse, SizerService};
use context::RequestContext;
use helpers::{extract_query_params, get_client_ip, header_str, http_date, peer_ip, rate_limit_key};
use routes::Route;
use special_endpoints::EndpointResponse;

/// ImageSizerProxy implements the Pingora ProxyHttp trait
/// Handles routing, rate limiting and image rendering
pub struct ImageSizerProxy {
    service: Arc<SizerService>,
    rate_limit_manager: Option<Arc<RateLimitManager>>,
    /// Idle-limiter eviction is started on the first request, inside Pingora's runtime
    cleanup_started: AtomicBool,
}

impl ImageSizerProxy {
    pub fn new(service: Arc<SizerService>, rate_limit_manager: Option<Arc<RateLimitManager>>) -> Self {
        Self {
            service,
            rate_limit_manager,
            cleanup_started: AtomicBool::new(false),
        }
    }

    async fn write_endpoint_response(
        &self,
        session: &mut Session,
        response: EndpointResponse,
    ) -> Result<()> {
        let mut header = ResponseHeader::build(response.status, None)?;
        header.insert_header("Content-Type", response.content_type)?;
        header.insert_header("Content-Length", response.body.len().to_string())?;

        if response.body.is_empty() {
            session
                .write_response_header(Box::new(header), true)
                .await?;
        } else {
            session
                .write_response_header(Box::new(header), false)
                .await?;
            session
                .write_response_body(Some(Bytes::from(response.body)), true)
                .await?;
        }
        Ok(())
    }

    async fn write_image_response(
        &self,
        session: &mut Session,
        response: SizerResponse,
    ) -> Result<()> {
        let (status, body) = match response {
            SizerResponse::Image { ref data, .. } => (200, Some(data.clone())),
            SizerResponse::NotModified { .. } => (304, None),
        };

        let mut header = ResponseHeader::build(status, None)?;
        header.insert_header("Content-Type", IMAGE_CONTENT_TYPE)?;
        header.insert_header("ETag", response.etag())?;
        header.insert_header("Cache-Control", IMAGE_CACHE_CONTROL)?;
        header.insert_header("Last-Modified", http_date(chrono::Utc::now()))?;

        match body {
            Some(data) => {
                header.insert_header("Content-Length", data.len().to_string())?;
                session
                    .write_response_header(Box::new(header), false)
                    .await?;
                session.write_response_body(Some(data), true).await?;
            }
            None => {
                session
                    .write_response_header(Box::new(header), true)
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_route(&self, session: &mut Session, route: Route) -> Result<()> {
        match route {
            Route::Ping => {
                self.write_endpoint_response(session, special_endpoints::handle_ping())
                    .await
            }
            Route::Health => {
                let check = self.service.health_check().await;
                let response = special_endpoints::handle_health(&check, chrono::Utc::now());
                self.write_endpoint_response(session, response).await
            }
            Route::Ready => {
                let check = self.service.health_check().await;
                let response = special_endpoints::handle_ready(&check, chrono::Utc::now());
                self.write_endpoint_response(session, response).await
            }
            Route::Sizer(variant) => {
                let req = session.req_header();
                let query = extract_query_params(req);
                let if_none_match = header_str(req, "if-none-match").map(str::to_string);

                match self
                    .service
                    .handle(variant, &query, if_none_match.as_deref())
                    .await
                {
                    Ok(response) => self.write_image_response(session, response).await,
                    Err(e) => {
                        self.write_endpoint_response(session, EndpointResponse::from(&e))
                            .await
                    }
                }
            }
            Route::MethodNotAllowed => {
                self.write_endpoint_response(session, special_endpoints::handle_method_not_allowed())
                    .await
            }
            Route::NotFound => {
                self.write_endpoint_response(session, special_endpoints::handle_not_found())
                    .await
            }
        }
    }
}

#[async_trait]
impl ProxyHttp for ImageSizerProxy {
    type CTX = RequestContext;

    /// Create a new request context for each incoming request
    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new("GET".to_string(), "/".to_string())
    }

    /// Never reached: request_filter answers every request
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        tracing::error!(
            request_id = %ctx.request_id(),
            path = %ctx.path(),
            "Request reached upstream selection"
        );
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "image sizer has no upstream",
        ))
    }

    /// Route, rate limit and answer the request
    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let (method, path) = {
            let req = session.req_header();
            (req.method.as_str().to_string(), req.uri.path().to_string())
        };
        let route = Route::resolve(&method, &path);
        ctx.set_request(&method, &path, route);

        if route.is_rate_limited() {
            if let Some(manager) = &self.rate_limit_manager {
                if !self.cleanup_started.swap(true, Ordering::Relaxed) {
                    manager.start_cleanup_task(None);
                }

                let key = rate_limit_key(
                    header_str(session.req_header(), "x-forwarded-for"),
                    &peer_ip(session),
                );
                if manager.check(&key).is_err() {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        client = %key,
                        path = %path,
                        "Rate limit exceeded"
                    );
                    self.write_endpoint_response(session, special_endpoints::handle_rate_limited())
                        .await?;
                    return Ok(true);
                }
            }
        }

        self.handle_route(session, route).await?;

        // Response already sent
        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        _e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);

        tracing::info!(
            request_id = %ctx.request_id(),
            client_ip = %get_client_ip(session),
            method = %ctx.method(),
            path = %ctx.path(),
            route = ctx.route().name(),
            status_code = status_code,
            duration_ms = ctx.elapsed_ms(),
            "Request completed"
        );
    }
}
