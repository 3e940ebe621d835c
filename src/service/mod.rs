//! Request orchestration
//!
//! [`SizerService`] runs one sizing request from query to JPEG bytes,
//! independent of the HTTP framework in front of it. Checks run in a fixed
//! order and the first failure ends the request:
//!
//! 1. requested dimensions are allow-listed
//! 2. requested dimensions are within the output ceiling
//! 3. `src` is present
//! 4. `src` resolves to an allowed source
//! 5. fetch and decode
//! 6. decoded dimensions are within the input ceiling
//! 7. crop zone lies inside the decoded image (only when a crop was asked for)
//! 8. the actual output size, including an axis derived from the aspect
//!    ratio, is within the output ceiling
//! 9. crop, resize, background, encode

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{RejectReason, SizerError};
use crate::sizer::{
    calculate_etag, decode_image, encode_jpeg, output_dimensions, transform_image,
    validate_crop_zone, DimensionPolicy, ImageError, JpegDefaults, ParamsVariant, QueryParams,
    SizerParams,
};
use crate::source::{ResolvedSource, SourceResolver};
use crate::storage::{ObjectStore, StorageError, UrlFetcher};

/// Outcome of a successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizerResponse {
    /// Freshly encoded JPEG
    Image { data: Bytes, etag: String },
    /// The client already holds this exact rendition
    NotModified { etag: String },
}

impl SizerResponse {
    pub fn etag(&self) -> &str {
        match self {
            SizerResponse::Image { etag, .. } | SizerResponse::NotModified { etag } => etag,
        }
    }
}

/// Shared, read-only request pipeline
pub struct SizerService {
    policy: DimensionPolicy,
    resolver: SourceResolver,
    defaults: JpegDefaults,
    object_store: Arc<dyn ObjectStore>,
    url_fetcher: Arc<dyn UrlFetcher>,
    fetch_timeout: Duration,
}

impl SizerService {
    pub fn new(
        policy: DimensionPolicy,
        resolver: SourceResolver,
        defaults: JpegDefaults,
        object_store: Arc<dyn ObjectStore>,
        url_fetcher: Arc<dyn UrlFetcher>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            resolver,
            defaults,
            object_store,
            url_fetcher,
            fetch_timeout,
        }
    }

    /// Wire the pipeline from a validated config and the given collaborators.
    pub fn from_config(
        config: &Config,
        object_store: Arc<dyn ObjectStore>,
        url_fetcher: Arc<dyn UrlFetcher>,
    ) -> Result<Self, String> {
        Ok(Self::new(
            config.dimension_policy(),
            config.source_resolver()?,
            config.jpeg_defaults(),
            object_store,
            url_fetcher,
            config.request_timeout(),
        ))
    }

    /// Reachability of the object store, for health probes.
    pub async fn health_check(&self) -> Result<(), StorageError> {
        self.object_store.health_check().await
    }

    pub async fn handle(
        &self,
        variant: ParamsVariant,
        query: &QueryParams,
        if_none_match: Option<&str>,
    ) -> Result<SizerResponse, SizerError> {
        let params = variant.derive(query, &self.defaults);

        if !self.policy.is_allowed_dimension(params.width, params.height) {
            tracing::error!(
                width = params.width,
                height = params.height,
                "invalid dimensions"
            );
            return Err(RejectReason::InvalidDimensions.into());
        }

        if let Err(e) = self
            .policy
            .validate_output_dimensions(params.width, params.height)
        {
            tracing::error!(
                width = params.width,
                height = params.height,
                "requested output dimensions exceed limit"
            );
            return Err(e);
        }

        let src = match query.get("src").filter(|s| !s.is_empty()) {
            Some(src) => src,
            None => {
                tracing::error!("source URL is required");
                return Err(RejectReason::SourceRequired.into());
            }
        };

        let source = self.resolver.resolve(src).map_err(|e| {
            tracing::error!(error = %e, "invalid source URL");
            SizerError::from(RejectReason::InvalidSource)
        })?;

        let data = self.fetch(&source).await?;

        let img = run_blocking(move || decode_image(&data).map_err(SizerError::from)).await?;
        let (source_width, source_height) = img.dimensions();
        let (source_width, source_height) = (source_width as i64, source_height as i64);

        if let Err(e) = self
            .policy
            .validate_input_dimensions(source_width, source_height)
        {
            tracing::error!(
                source = ?source,
                width = source_width,
                height = source_height,
                "image dimensions exceed limit"
            );
            return Err(e);
        }

        let crop = if params.crop.has_area() {
            if let Err(e) = validate_crop_zone(source_width, source_height, &params.crop) {
                tracing::error!(
                    width = source_width,
                    height = source_height,
                    crop = %params.crop,
                    "invalid crop zone"
                );
                return Err(e);
            }
            Some(params.crop)
        } else {
            None
        };

        if params.width > 0 || params.height > 0 {
            let (base_w, base_h) = match &crop {
                Some(zone) => (zone.width() as u32, zone.height() as u32),
                None => (source_width as u32, source_height as u32),
            };
            let (out_w, out_h) = output_dimensions(base_w, base_h, params.width, params.height);
            if let Err(e) = self
                .policy
                .validate_output_dimensions(out_w as i64, out_h as i64)
            {
                tracing::error!(
                    width = out_w,
                    height = out_h,
                    "requested output dimensions exceed limit"
                );
                return Err(e);
            }
        }

        let (encoded, etag) = run_blocking(move || render(img, crop, params)).await?;

        tracing::debug!(
            bytes = encoded.len(),
            etag = %etag,
            "image rendered"
        );

        if if_none_match.map(str::trim) == Some(etag.as_str()) {
            return Ok(SizerResponse::NotModified { etag });
        }

        Ok(SizerResponse::Image {
            data: Bytes::from(encoded),
            etag,
        })
    }

    async fn fetch(&self, source: &ResolvedSource) -> Result<Bytes, SizerError> {
        let timeout_secs = self.fetch_timeout.as_secs();

        let result = match source {
            ResolvedSource::ObjectStore { bucket, key } => {
                tokio::time::timeout(
                    self.fetch_timeout,
                    self.object_store.fetch_object(bucket, key),
                )
                .await
            }
            ResolvedSource::Http { url } => {
                tracing::warn!(url = %url, "unmapped source URL - loading from URL");
                tokio::time::timeout(self.fetch_timeout, self.url_fetcher.fetch_url(url)).await
            }
        };

        result
            .unwrap_or(Err(StorageError::Timeout(timeout_secs)))
            .map_err(|e| {
                tracing::error!(source = ?source, error = %e, "error loading image");
                SizerError::from(e)
            })
    }
}

/// Crop, resize, composite and encode; returns the JPEG bytes and their ETag.
fn render(
    img: DynamicImage,
    crop: Option<crate::sizer::Rectangle>,
    params: SizerParams,
) -> Result<(Vec<u8>, String), SizerError> {
    let img = transform_image(img, crop.as_ref(), &params).map_err(|e| {
        match &e {
            ImageError::InvalidColor(_) => tracing::error!(
                background = %params.background_color,
                "invalid background color"
            ),
            _ => tracing::error!(error = %e, "error transforming image"),
        }
        SizerError::from(e)
    })?;

    let encoded = encode_jpeg(&img, params.quality).map_err(|e| {
        tracing::error!(error = %e, "error encoding image");
        SizerError::from(e)
    })?;

    let etag = calculate_etag(&encoded.data, &params.to_string());
    Ok((encoded.data, etag))
}

/// Run CPU-bound work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, SizerError>
where
    F: FnOnce() -> Result<T, SizerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SizerError::EncodeFailure(format!("image worker failed: {e}")))?
}
