//! AWS S3 object store for production use.
//!
//! ## Configuration
//!
//! - `S3_BUCKET`: bucket name (required)
//! - `S3_PREFIX`: key prefix prepended to every object (default: none)
//!
//! Region and credentials come from the standard AWS environment via
//! `aws-config`.
//!
//! Versions are S3 ETags; conditional puts use `If-Match` and
//! `If-None-Match: *`.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{ObjectStore, ObjectSummary, PutCondition, PutOutcome, StoredObject};

/// Error type for the S3 store.
#[derive(Debug, thiserror::Error)]
pub enum S3StoreError {
    /// Missing or invalid configuration.
    #[error("S3 configuration error: {0}")]
    Config(String),
    /// A request to S3 failed.
    #[error("S3 {operation} failed for {key}: {message}")]
    Request {
        /// Operation name.
        operation: &'static str,
        /// Object key or prefix.
        key: String,
        /// Error text from the SDK.
        message: String,
    },
}

impl S3StoreError {
    fn request(operation: &'static str, key: &str, message: impl std::fmt::Display) -> Self {
        Self::Request {
            operation,
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

/// Configuration for the S3 store.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix, without trailing slash.
    pub prefix: Option<String>,
}

impl S3Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, S3StoreError> {
        let bucket = std::env::var("S3_BUCKET")
            .ok()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| S3StoreError::Config("S3_BUCKET is not set".to_string()))?;
        let prefix = std::env::var("S3_PREFIX")
            .ok()
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Ok(Self { bucket, prefix })
    }
}

/// S3-backed object store.
pub struct S3ObjectStore {
    client: Client,
    config: S3Config,
}

impl S3ObjectStore {
    /// Create a store from an SDK client.
    pub fn new(client: Client, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Create a store from the environment.
    pub async fn from_env() -> Result<Self, S3StoreError> {
        let config = S3Config::from_env()?;
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        info!(bucket = %config.bucket, prefix = ?config.prefix, "S3 object store configured");
        Ok(Self::new(Client::new(&sdk_config), config))
    }

    fn full_key(&self, key: &str) -> String {
        match &self.config.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        match &self.config.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|k| k.strip_prefix('/'))
                .unwrap_or(key),
            None => key,
        }
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()).unwrap_or_default()
}

/// HTTP status carried by an SDK error, if a response was received.
fn http_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    type Error = S3StoreError;

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Self::Error> {
        let full_key = self.full_key(key);
        let result = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&full_key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let version = output.e_tag().map(str::to_string);
                let content_type = output.content_type().map(str::to_string);
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| S3StoreError::request("GetObject", key, e))?;
                debug!(key = %full_key, "S3 object loaded");
                Ok(Some(StoredObject {
                    body: bytes.into_bytes().to_vec(),
                    version,
                    content_type,
                }))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    debug!(key = %full_key, "S3 object not found");
                    Ok(None)
                } else {
                    Err(S3StoreError::request("GetObject", key, service_err))
                }
            }
        }
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        condition: PutCondition,
    ) -> Result<PutOutcome, Self::Error> {
        let full_key = self.full_key(key);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&full_key)
            .content_type(content_type)
            .body(ByteStream::from(body));

        request = match condition {
            PutCondition::Always => request,
            PutCondition::IfMatch(etag) => request.if_match(etag),
            PutCondition::IfAbsent => request.if_none_match("*"),
        };

        match request.send().await {
            Ok(output) => {
                debug!(key = %full_key, "S3 object placed");
                Ok(PutOutcome::Written {
                    version: output.e_tag().map(str::to_string),
                })
            }
            // 412 on a stale ETag, 409 when a concurrent conditional write won.
            Err(err) if matches!(http_status(&err), Some(412) | Some(409)) => {
                debug!(key = %full_key, "S3 conditional put lost");
                Ok(PutOutcome::PreconditionFailed)
            }
            Err(err) => Err(S3StoreError::request("PutObject", key, err.into_service_error())),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Self::Error> {
        let full_prefix = self.full_key(prefix);
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(&full_prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| S3StoreError::request("ListObjectsV2", prefix, e.into_service_error()))?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                objects.push(ObjectSummary {
                    key: self.strip_prefix(key).to_string(),
                    last_modified: object.last_modified().map(to_chrono).unwrap_or_default(),
                });
            }
        }
        debug!(prefix = %full_prefix, count = objects.len(), "S3 folder listed");
        Ok(objects)
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        let full_key = self.full_key(key);
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| S3StoreError::request("DeleteObject", key, e.into_service_error()))?;
        info!(key = %full_key, "S3 object deleted");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .is_ok()
    }
}
