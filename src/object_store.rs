// src/object_store.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Pluggable remote-store abstraction.
// Two backends implement it:
//   - S3Store     (aws-sdk-s3)         -> src/s3_store.rs
//   - MemoryStore (in-process buckets) -> src/memory_store.rs

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_PRESIGN_EXPIRATION, MAX_PRESIGN_EXPIRATION};
use crate::error::{Result, S3ToolsError};
use crate::local_fs;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub keys: Vec<String>,
    /// Present iff more pages remain.
    pub next_cursor: Option<String>,
}

/// HEAD-style object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub e_tag: Option<String>,
    /// Seconds since the Unix epoch.
    pub last_modified: Option<i64>,
    pub storage_class: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Optional settings for bucket creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketConfig {
    /// Region the bucket is placed in (`CreateBucketConfiguration.LocationConstraint`).
    pub location_constraint: Option<String>,
    /// Canned ACL (`private`, `public-read`, ...).
    pub acl: Option<String>,
}

/// Operations a presigned URL can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMethod {
    GetObject,
    PutObject,
    DeleteObject,
    HeadObject,
}

impl ClientMethod {
    /// HTTP verb the signed request uses.
    pub fn http_method(self) -> &'static str {
        match self {
            ClientMethod::GetObject => "GET",
            ClientMethod::PutObject => "PUT",
            ClientMethod::DeleteObject => "DELETE",
            ClientMethod::HeadObject => "HEAD",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClientMethod::GetObject => "get_object",
            ClientMethod::PutObject => "put_object",
            ClientMethod::DeleteObject => "delete_object",
            ClientMethod::HeadObject => "head_object",
        }
    }
}

impl FromStr for ClientMethod {
    type Err = S3ToolsError;

    // Accepts both snake_case and the SDK's PascalCase operation names.
    fn from_str(s: &str) -> Result<Self> {
        match s.replace('_', "").to_ascii_lowercase().as_str() {
            "getobject" => Ok(ClientMethod::GetObject),
            "putobject" => Ok(ClientMethod::PutObject),
            "deleteobject" => Ok(ClientMethod::DeleteObject),
            "headobject" => Ok(ClientMethod::HeadObject),
            _ => Err(S3ToolsError::InvalidArgument(format!(
                "unsupported client method for presigning: {s:?}"
            ))),
        }
    }
}

/// Parameters for a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub method: ClientMethod,
    pub bucket: String,
    pub key: String,
    /// Optional verb override; must agree with `method`.
    pub http_method: Option<String>,
    pub expiration: Duration,
}

impl PresignRequest {
    pub fn new(method: ClientMethod, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key: key.into(),
            http_method: None,
            expiration: DEFAULT_PRESIGN_EXPIRATION,
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_http_method(mut self, verb: impl Into<String>) -> Self {
        self.http_method = Some(verb.into());
        self
    }

    /// Reject malformed parameters before anything is signed.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(S3ToolsError::InvalidArgument("presign: bucket is required".into()));
        }
        if self.key.is_empty() {
            return Err(S3ToolsError::InvalidArgument("presign: key is required".into()));
        }
        if self.expiration.is_zero() || self.expiration > MAX_PRESIGN_EXPIRATION {
            return Err(S3ToolsError::InvalidArgument(format!(
                "presign: expiration must be between 1s and {}s, got {}s",
                MAX_PRESIGN_EXPIRATION.as_secs(),
                self.expiration.as_secs()
            )));
        }
        if let Some(verb) = &self.http_method {
            if !verb.eq_ignore_ascii_case(self.method.http_method()) {
                return Err(S3ToolsError::InvalidArgument(format!(
                    "presign: HTTP method {verb} does not match {}",
                    self.method.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// The remote object-store collaborator.
///
/// Every method is a single remote call (or a single local+remote pair for
/// `put_file`). Implementations keep the store's error classification:
/// `NoSuchBucket` for a missing bucket, `NotFound` for a missing key, and
/// `Remote` with the original error code for everything else.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// One listing page under `prefix`, continuing from `cursor` when given.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        cursor: Option<&str>,
    ) -> Result<ListingPage>;

    /// Whole object body.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Store `body` under `key`; returns the object URL.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<String>;

    /// Upload a local file; backends may stream it instead of buffering.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<String> {
        let body = local_fs::read_all_bytes(path).await?;
        self.put_object(bucket, key, body).await
    }

    /// Delete `key`; deleting an absent key is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Metadata for `key`, or `None` if the key does not exist.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>>;

    /// Server-side copy.
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()>;

    async fn create_bucket(&self, name: &str, config: Option<&BucketConfig>) -> Result<bool>;

    /// Returns `false` if the bucket did not exist.
    async fn delete_bucket(&self, name: &str) -> Result<bool>;

    async fn list_buckets(&self) -> Result<Vec<String>>;

    async fn bucket_exists(&self, name: &str) -> Result<bool>;

    async fn presigned_url(&self, request: &PresignRequest) -> Result<String>;
}
