//! S3-based recording storage implementation
//!
//! Stores recordings in AWS S3 (or S3-compatible services like MinIO):
//! `{prefix}/{station_short_name}/{path}`

use async_trait::async_trait;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use super::error::FileStorageError;
use super::storage::{
    BlobMetadata, BlobReader, RecordingStorage, guess_mimetype, validate_relative_path,
    validate_station,
};

/// S3-based recording storage
#[derive(Debug, Clone)]
pub struct S3Storage {
    /// S3 client
    client: Client,
    /// S3 bucket name
    bucket: String,
    /// Key prefix for all recordings
    prefix: String,
}

impl S3Storage {
    /// Create a new S3 storage with the given configuration
    pub async fn new(
        bucket: String,
        prefix: String,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, FileStorageError> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_sdk_s3::config::Region::new(region));
        }

        let config = config_loader.load().await;

        // Build S3 client with optional custom endpoint
        let mut s3_config = aws_sdk_s3::config::Builder::from(&config);

        if let Some(endpoint_url) = endpoint {
            // Path-style addressing for S3-compatible services
            s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
        }

        let client = Client::from_conf(s3_config.build());

        tracing::debug!(
            bucket = %bucket,
            prefix = %prefix,
            "S3 recording storage initialized"
        );

        Ok(Self {
            client,
            bucket,
            prefix,
        })
    }

    /// Get the full S3 key for a recording
    fn object_key(&self, station: &str, path: &str) -> Result<String, FileStorageError> {
        validate_station(station)?;
        validate_relative_path(path)?;
        Ok(compose_key(&self.prefix, station, path))
    }
}

/// `{prefix}/{station}/{path}` with redundant separators removed
fn compose_key(prefix: &str, station: &str, path: &str) -> String {
    let path = path.trim_start_matches("./");
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", station, path)
    } else {
        format!("{}/{}/{}", prefix, station, path)
    }
}

fn to_utc(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl RecordingStorage for S3Storage {
    async fn read_stream(
        &self,
        station: &str,
        path: &str,
    ) -> Result<BlobReader, FileStorageError> {
        let key = self.object_key(station, path)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    FileStorageError::not_found(station, path)
                } else {
                    FileStorageError::Backend(format!("S3 get_object error: {}", service_err))
                }
            })?;

        tracing::trace!(station, path, key = %key, "Recording opened from S3");
        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn metadata(
        &self,
        station: &str,
        path: &str,
    ) -> Result<BlobMetadata, FileStorageError> {
        let key = self.object_key(station, path)?;

        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    FileStorageError::not_found(station, path)
                } else {
                    FileStorageError::Backend(format!("S3 head_object error: {}", service_err))
                }
            })?;

        Ok(BlobMetadata {
            size_bytes: head.content_length().unwrap_or(0).max(0) as u64,
            last_modified: head.last_modified().and_then(to_utc),
        })
    }

    async fn mimetype(&self, station: &str, path: &str) -> Option<String> {
        let key = self.object_key(station, path).ok()?;

        let stored = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(head) => head
                .content_type()
                .filter(|ct| !ct.is_empty() && *ct != "binary/octet-stream")
                .map(str::to_string),
            Err(e) => {
                tracing::debug!(station, path, error = %e, "S3 head_object failed for mimetype");
                None
            }
        };

        stored.or_else(|| guess_mimetype(path))
    }

    async fn delete(&self, station: &str, path: &str) -> Result<(), FileStorageError> {
        let key = self.object_key(station, path)?;

        // S3 delete_object doesn't fail if object doesn't exist
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| FileStorageError::Backend(format!("S3 delete_object error: {}", e)))?;

        tracing::debug!(station, path, "Recording deleted from S3");

        Ok(())
    }
}
