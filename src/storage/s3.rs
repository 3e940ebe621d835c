// S3-backed object store

use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectStore, StorageError};
use crate::config::StorageConfig;

/// [`ObjectStore`] over an aws-sdk-s3 client
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the storage section.
    ///
    /// Static credentials are used when both keys are configured, otherwise
    /// the default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "static",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::info!(
            region = %config.region,
            endpoint = ?config.endpoint,
            force_path_style = config.force_path_style,
            "S3 client configured"
        );

        Self::new(Client::from_conf(s3_config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if no_such_key {
                    StorageError::NotFound(format!("{bucket}/{key}"))
                } else {
                    StorageError::Io(format!("S3 fetch failed: {e}"))
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Io(format!("Failed to read S3 body: {e}")))?;

        Ok(body.into_bytes())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.client
            .list_buckets()
            .send()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Io(e.to_string()))
    }
}
