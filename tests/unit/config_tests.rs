// Configuration module unit tests

use img_sizer::config::*;
use img_sizer::sizer::Dimension;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_env_var_substitution() {
    std::env::set_var("IMG_SIZER_TEST_BUCKET", "substituted-bucket");
    std::env::set_var("IMG_SIZER_TEST_PORT", "9090");

    let yaml = r#"
server:
  port: ${IMG_SIZER_TEST_PORT}
allowed_sources:
  - pattern: "images.example.com"
    bucket: "${IMG_SIZER_TEST_BUCKET}"
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(
        config.allowed_sources[0].bucket.as_deref(),
        Some("substituted-bucket")
    );
}

#[test]
fn test_missing_env_var_is_error() {
    std::env::remove_var("IMG_SIZER_TEST_UNSET_VAR");
    let yaml = "storage:\n  access_key: \"${IMG_SIZER_TEST_UNSET_VAR}\"\n";

    let err = Config::from_yaml_with_env(yaml).unwrap_err();
    assert!(err.contains("IMG_SIZER_TEST_UNSET_VAR"));
}

#[test]
fn test_invalid_yaml_is_error() {
    assert!(Config::from_yaml_with_env("server: [unclosed").is_err());
    assert!(Config::from_yaml_with_env("server:\n  port: \"not a number\"\n").is_err());
}

#[test]
fn test_server_section() {
    let yaml = r#"
server:
  address: "127.0.0.1"
  port: 3000
  threads: 8
  request_timeout: 5
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert_eq!(config.server.listen_addr(), "127.0.0.1:3000");
    assert_eq!(config.server.threads, 8);
    assert_eq!(config.request_timeout(), std::time::Duration::from_secs(5));
}

#[test]
fn test_allowed_dimensions_parse() {
    let yaml = r#"
allowed_dimensions:
  - width: 1920
    height: 1080
  - { width: 0, height: 300 }
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert_eq!(
        config.allowed_dimensions,
        vec![Dimension::new(1920, 1080), Dimension::new(0, 300)]
    );
    let policy = config.dimension_policy();
    assert!(policy.is_allowed_dimension(1920, 1080));
    assert!(policy.is_allowed_dimension(0, 1080));
    assert!(policy.is_allowed_dimension(400, 300));
    assert!(!policy.is_allowed_dimension(1920, 1000));
}

#[test]
fn test_negative_allowed_dimension_fails_validation() {
    let config =
        Config::from_yaml_with_env("allowed_dimensions:\n  - { width: -1, height: 10 }\n")
            .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_rule_with_bucket_and_matcher_fails_validation() {
    let yaml = r#"
allowed_sources:
  - pattern: "a.example.com"
    bucket: "b"
    matcher: "^https://a\\.example\\.com/([^/]+)/(.+)$"
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_pattern_fails_validation() {
    let config =
        Config::from_yaml_with_env("allowed_sources:\n  - pattern: \"\"\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_pattern_that_is_not_a_valid_regex_fails_validation() {
    let config =
        Config::from_yaml_with_env("allowed_sources:\n  - pattern: \"bad(host\"\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_jpeg_defaults_from_config() {
    let config =
        Config::from_yaml_with_env("jpeg:\n  quality: 90\n  background: \"#ffffff\"\n").unwrap();
    assert!(config.validate().is_ok());

    let defaults = config.jpeg_defaults();
    assert_eq!(defaults.quality, 90);
    assert_eq!(defaults.background, "#ffffff");
}

#[test]
fn test_static_credentials() {
    let yaml = r#"
storage:
  endpoint: "http://localhost:9000"
  access_key: "minio"
  secret_key: "minio123"
  force_path_style: true
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert!(config.validate().is_ok());
    assert!(config.storage.has_static_credentials());
    assert!(config.storage.force_path_style);
    assert_eq!(
        config.storage.endpoint.as_deref(),
        Some("http://localhost:9000")
    );
}

#[test]
fn test_load_rejects_invalid_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"server:\n  port: 0\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_ok());
    assert!(Config::load(temp_file.path()).is_err());
}

#[test]
fn test_rate_limit_section() {
    let config = Config::from_yaml_with_env(
        "rate_limit:\n  enabled: true\n  max_requests: 10\n  window_seconds: 2\n",
    )
    .unwrap();

    assert_eq!(config.rate_limit.max_requests, 10);
    assert_eq!(config.rate_limit.window(), std::time::Duration::from_secs(2));
}

#[test]
fn test_sample_config_is_valid() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.yaml")).unwrap();

    assert_eq!(config.allowed_sources.len(), 4);
    assert!(config.allowed_dimensions.contains(&Dimension::new(800, 600)));
    assert!(config.source_resolver().is_ok());
}
