// Sizing pipeline tests against in-memory sources

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use img_sizer::config::Config;
use img_sizer::error::{RejectReason, SizerError};
use img_sizer::service::{SizerResponse, SizerService};
use img_sizer::sizer::{ParamsVariant, QueryParams};
use img_sizer::storage::{ObjectStore, StorageError, UrlFetcher};

const CONFIG: &str = r#"
allowed_sources:
  - pattern: "images.example.com"
    bucket: "photos"
  - pattern: "cdn.example.org"
allowed_dimensions:
  - { width: 800, height: 600 }
  - { width: 400, height: 300 }
  - { width: 100, height: 100 }
"#;

const OBJECT_URL: &str = "https://images.example.com/fixtures/source.png";
const HTTP_URL: &str = "https://cdn.example.org/fixtures/source.png";

/// 1000x800, red with a green block at [100, 500) x [100, 400)
fn fixture_png() -> Bytes {
    let img = RgbImage::from_fn(1000, 800, |x, y| {
        if (100..500).contains(&x) && (100..400).contains(&y) {
            Rgb([0, 255, 0])
        } else {
            Rgb([255, 0, 0])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(buf.into_inner())
}

#[derive(Default)]
struct MemoryStore {
    objects: HashMap<(String, String), Bytes>,
    healthy: bool,
}

impl MemoryStore {
    fn with_object(bucket: &str, key: &str, data: Bytes) -> Self {
        let mut objects = HashMap::new();
        objects.insert((bucket.to_string(), key.to_string()), data);
        Self {
            objects,
            healthy: true,
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{bucket}/{key}")))
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        if self.healthy {
            Ok(())
        } else {
            Err(StorageError::Io("connection refused".to_string()))
        }
    }
}

#[derive(Default)]
struct MemoryFetcher {
    urls: HashMap<String, Bytes>,
    calls: AtomicUsize,
}

#[async_trait]
impl UrlFetcher for MemoryFetcher {
    async fn fetch_url(&self, url: &str) -> Result<Bytes, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}

struct SlowStore;

#[async_trait]
impl ObjectStore for SlowStore {
    async fn fetch_object(&self, _bucket: &str, _key: &str) -> Result<Bytes, StorageError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Bytes::new())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

fn service_with(config: &Config, store: MemoryStore, fetcher: MemoryFetcher) -> SizerService {
    SizerService::from_config(config, Arc::new(store), Arc::new(fetcher)).unwrap()
}

fn service() -> SizerService {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    service_with(
        &config,
        MemoryStore::with_object("photos", "fixtures/source.png", fixture_png()),
        MemoryFetcher::default(),
    )
}

fn query(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn decoded(response: &SizerResponse) -> DynamicImage {
    match response {
        SizerResponse::Image { data, .. } => image::load_from_memory(data).unwrap(),
        SizerResponse::NotModified { .. } => panic!("expected an image body"),
    }
}

fn assert_rejected(result: Result<SizerResponse, SizerError>, expected: RejectReason) {
    match result {
        Err(SizerError::InvalidRequest(reason)) => assert_eq!(reason, expected),
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

fn is_red(px: [u8; 4]) -> bool {
    px[0] > 200 && px[1] < 60 && px[2] < 60
}

fn is_green(px: [u8; 4]) -> bool {
    px[1] > 200 && px[0] < 60 && px[2] < 60
}

#[tokio::test]
async fn test_resize_from_object_store() {
    let service = service();
    let response = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", OBJECT_URL), ("width", "800"), ("height", "600")]),
            None,
        )
        .await
        .unwrap();

    let img = decoded(&response);
    assert_eq!(img.dimensions(), (800, 600));
    // Fill crops 25px off the top and bottom, so the corner stays red
    assert!(is_red(img.get_pixel(2, 2).0));
    assert!(response.etag().starts_with('"') && response.etag().ends_with('"'));
}

#[tokio::test]
async fn test_density_doubles_output() {
    let service = service();
    let response = service
        .handle(
            ParamsVariant::Resize,
            &query(&[
                ("src", OBJECT_URL),
                ("width", "400"),
                ("height", "300"),
                ("density", "2"),
            ]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(decoded(&response).dimensions(), (800, 600));
}

#[tokio::test]
async fn test_width_only_keeps_aspect_ratio() {
    let service = service();
    let response = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", OBJECT_URL), ("width", "400")]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(decoded(&response).dimensions(), (400, 320));
}

#[tokio::test]
async fn test_combined_with_crop_zone() {
    let service = service();
    let response = service
        .handle(
            ParamsVariant::Combined,
            &query(&[
                ("src", OBJECT_URL),
                ("width", "800"),
                ("height", "600"),
                ("crop[x]", "100"),
                ("crop[y]", "100"),
                ("crop[width]", "400"),
                ("crop[height]", "300"),
            ]),
            None,
        )
        .await
        .unwrap();

    let img = decoded(&response);
    assert_eq!(img.dimensions(), (800, 600));
    assert!(is_green(img.get_pixel(2, 2).0));
    assert!(is_green(img.get_pixel(797, 597).0));
}

#[tokio::test]
async fn test_crop_route() {
    let service = service();
    let response = service
        .handle(
            ParamsVariant::Crop,
            &query(&[
                ("src", OBJECT_URL),
                ("x", "100"),
                ("y", "100"),
                ("width", "400"),
                ("height", "300"),
            ]),
            None,
        )
        .await
        .unwrap();

    let img = decoded(&response);
    assert_eq!(img.dimensions(), (400, 300));
    assert!(is_green(img.get_pixel(200, 150).0));
}

#[tokio::test]
async fn test_matching_if_none_match_is_not_modified() {
    let service = service();
    let q = query(&[("src", OBJECT_URL), ("width", "100"), ("height", "100")]);

    let first = service.handle(ParamsVariant::Resize, &q, None).await.unwrap();
    let etag = first.etag().to_string();

    let second = service
        .handle(ParamsVariant::Resize, &q, Some(&etag))
        .await
        .unwrap();
    assert_eq!(second, SizerResponse::NotModified { etag: etag.clone() });

    let third = service
        .handle(ParamsVariant::Resize, &q, Some("\"stale\""))
        .await
        .unwrap();
    assert!(matches!(third, SizerResponse::Image { .. }));
    assert_eq!(third.etag(), etag);
}

#[tokio::test]
async fn test_etag_changes_with_quality() {
    let service = service();
    let low = service
        .handle(
            ParamsVariant::Resize,
            &query(&[
                ("src", OBJECT_URL),
                ("width", "100"),
                ("height", "100"),
                ("quality", "20"),
            ]),
            None,
        )
        .await
        .unwrap();
    let high = service
        .handle(
            ParamsVariant::Resize,
            &query(&[
                ("src", OBJECT_URL),
                ("width", "100"),
                ("height", "100"),
                ("quality", "95"),
            ]),
            None,
        )
        .await
        .unwrap();

    assert_ne!(low.etag(), high.etag());
}

#[tokio::test]
async fn test_dimensions_checked_before_source() {
    let service = service();
    // No src at all, but the size is rejected first
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("width", "801"), ("height", "600")]),
                None,
            )
            .await,
        RejectReason::InvalidDimensions,
    );
}

#[tokio::test]
async fn test_output_ceiling_applies_with_allow_all() {
    let config = Config::from_yaml_with_env(&format!("{CONFIG}allow_all_dimensions: true\n"))
        .unwrap();
    let service = service_with(&config, MemoryStore::default(), MemoryFetcher::default());

    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("src", OBJECT_URL), ("width", "2001"), ("height", "10")]),
                None,
            )
            .await,
        RejectReason::OutputDimensionsExceeded,
    );
}

#[tokio::test]
async fn test_derived_axis_is_bounded_by_output_ceiling() {
    let tall = RgbImage::from_pixel(10, 500, Rgb([0, 0, 255]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(tall)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();

    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    let service = service_with(
        &config,
        MemoryStore::with_object("photos", "tall.png", Bytes::from(buf.into_inner())),
        MemoryFetcher::default(),
    );

    // width=100 matches the 100x100 entry with height as a wildcard, but the
    // aspect ratio turns it into 100x5000
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("src", "https://images.example.com/tall.png"), ("width", "100")]),
                None,
            )
            .await,
        RejectReason::OutputDimensionsExceeded,
    );

    let response = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", "https://images.example.com/tall.png"), ("height", "300")]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(decoded(&response).dimensions(), (6, 300));
}

#[tokio::test]
async fn test_missing_source_is_rejected() {
    let service = service();
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("width", "800"), ("height", "600")]),
                None,
            )
            .await,
        RejectReason::SourceRequired,
    );
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("src", ""), ("width", "800"), ("height", "600")]),
                None,
            )
            .await,
        RejectReason::SourceRequired,
    );
}

#[tokio::test]
async fn test_unknown_source_host_is_rejected() {
    let service = service();
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[
                    ("src", "https://evil.example.net/a.png"),
                    ("width", "800"),
                    ("height", "600"),
                ]),
                None,
            )
            .await,
        RejectReason::InvalidSource,
    );
}

#[tokio::test]
async fn test_missing_object_is_server_error() {
    let service = service();
    let err = service
        .handle(
            ParamsVariant::Resize,
            &query(&[
                ("src", "https://images.example.com/missing.png"),
                ("width", "800"),
                ("height", "600"),
            ]),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SizerError::SourceUnavailable(_)));
    assert_eq!(err.to_http_status(), 500);
    assert_eq!(err.reason(), "error processing image");
}

#[tokio::test]
async fn test_undecodable_source_is_server_error() {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    let service = service_with(
        &config,
        MemoryStore::with_object("photos", "fixtures/source.png", Bytes::from_static(b"nope")),
        MemoryFetcher::default(),
    );

    let err = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", OBJECT_URL), ("width", "800"), ("height", "600")]),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_http_status(), 500);
}

#[tokio::test]
async fn test_input_ceiling_is_enforced() {
    let config =
        Config::from_yaml_with_env(&format!("{CONFIG}max_input_dimension: 900\n")).unwrap();
    let service = service_with(
        &config,
        MemoryStore::with_object("photos", "fixtures/source.png", fixture_png()),
        MemoryFetcher::default(),
    );

    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[("src", OBJECT_URL), ("width", "800"), ("height", "600")]),
                None,
            )
            .await,
        RejectReason::InputDimensionsExceeded,
    );
}

#[tokio::test]
async fn test_crop_outside_source_is_rejected() {
    let service = service();
    assert_rejected(
        service
            .handle(
                ParamsVariant::Crop,
                &query(&[
                    ("src", OBJECT_URL),
                    ("x", "700"),
                    ("y", "0"),
                    ("width", "400"),
                    ("height", "300"),
                ]),
                None,
            )
            .await,
        RejectReason::InvalidCropZone,
    );
}

#[tokio::test]
async fn test_invalid_background_is_rejected() {
    let service = service();
    assert_rejected(
        service
            .handle(
                ParamsVariant::Resize,
                &query(&[
                    ("src", OBJECT_URL),
                    ("width", "800"),
                    ("height", "600"),
                    ("background", "not-a-color"),
                ]),
                None,
            )
            .await,
        RejectReason::InvalidBackgroundColor,
    );
}

#[tokio::test]
async fn test_unmapped_source_goes_through_url_fetcher() {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    let mut fetcher = MemoryFetcher::default();
    fetcher.urls.insert(HTTP_URL.to_string(), fixture_png());
    let fetcher = Arc::new(fetcher);

    let service = SizerService::from_config(
        &config,
        Arc::new(MemoryStore::default()),
        fetcher.clone(),
    )
    .unwrap();

    let response = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", HTTP_URL), ("width", "100"), ("height", "100")]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(decoded(&response).dimensions(), (100, 100));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_fetch_times_out() {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();
    let service = SizerService::new(
        config.dimension_policy(),
        config.source_resolver().unwrap(),
        config.jpeg_defaults(),
        Arc::new(SlowStore),
        Arc::new(MemoryFetcher::default()),
        Duration::from_millis(50),
    );

    let err = service
        .handle(
            ParamsVariant::Resize,
            &query(&[("src", OBJECT_URL), ("width", "800"), ("height", "600")]),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SizerError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_health_check_reports_store_state() {
    let config = Config::from_yaml_with_env(CONFIG).unwrap();

    let healthy = service_with(&config, MemoryStore::with_object("b", "k", Bytes::new()), MemoryFetcher::default());
    assert!(healthy.health_check().await.is_ok());

    let down = service_with(&config, MemoryStore::default(), MemoryFetcher::default());
    assert!(down.health_check().await.is_err());
}
