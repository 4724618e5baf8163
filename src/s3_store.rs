// src/s3_store.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// ObjectStore backend on top of aws-sdk-s3.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::Path;
use tracing::debug;

use crate::config::S3Config;
use crate::error::{Result, S3ToolsError};
use crate::object_store::{
    BucketConfig, ClientMethod, ListingPage, ObjectMetadata, ObjectStore, PresignRequest,
};
use crate::s3_client::{build_client, endpoint_base};

/// S3 (or S3-compatible) store reached through one SDK client.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
    endpoint: String,
}

impl S3Store {
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let client = build_client(config).await?;
        let endpoint = endpoint_base(config, &client);
        debug!("S3Store ready, endpoint {}", endpoint);
        Ok(Self { client, endpoint })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}

/// Map an SDK failure onto the crate taxonomy, keeping the service code.
fn classify<E>(
    operation: &'static str,
    bucket: &str,
    key: Option<&str>,
    err: SdkError<E, HttpResponse>,
) -> S3ToolsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);

    match (code.as_deref(), status, key) {
        (Some("NoSuchBucket"), _, _) => S3ToolsError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
        (Some("NoSuchKey" | "NotFound" | "404"), _, Some(key)) | (None, Some(404), Some(key)) => {
            S3ToolsError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        }
        (Some("NotFound" | "404"), _, None) | (None, Some(404), None) => S3ToolsError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
        _ => {
            let message = err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
            S3ToolsError::Remote {
                operation,
                code: code.or_else(|| status.map(|s| s.to_string())),
                message,
            }
        }
    }
}

/// Unreserved characters plus `/` stay as they are.
const COPY_SOURCE_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// `bucket/key` with the key percent-encoded for `x-amz-copy-source`.
fn encode_copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, &COPY_SOURCE_ENCODE_SET))
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(max_keys);
        if let Some(token) = cursor {
            req = req.continuation_token(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| classify("ListObjectsV2", bucket, None, e))?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_owned))
            .collect();
        let next_cursor = match resp.is_truncated() {
            Some(true) => resp.next_continuation_token().map(str::to_owned),
            _ => None,
        };
        Ok(ListingPage { keys, next_cursor })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify("GetObject", bucket, Some(key), e))?;
        let data = resp.body.collect().await.map_err(|e| S3ToolsError::Remote {
            operation: "GetObject",
            code: None,
            message: format!("reading body of s3://{bucket}/{key}: {e}"),
        })?;
        Ok(data.into_bytes())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<String> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify("PutObject", bucket, None, e))?;
        Ok(self.url(bucket, key))
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<String> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| S3ToolsError::io(path, std::io::Error::other(e)))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| classify("PutObject", bucket, None, e))?;
        Ok(self.url(bucket, key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify("DeleteObject", bucket, None, e))?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>> {
        let resp = match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return match classify("HeadObject", bucket, Some(key), e) {
                    S3ToolsError::NotFound { .. } => Ok(None),
                    other => Err(other),
                };
            }
        };
        Ok(Some(ObjectMetadata {
            content_length: resp.content_length().unwrap_or_default().max(0) as u64,
            content_type: resp.content_type().map(str::to_owned),
            e_tag: resp.e_tag().map(str::to_owned),
            last_modified: resp.last_modified().map(|t| t.secs()),
            storage_class: resp.storage_class().map(|s| s.as_str().to_owned()),
            metadata: resp.metadata().cloned().unwrap_or_default(),
        }))
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(encode_copy_source(src_bucket, src_key))
            .bucket(dst_bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| match classify("CopyObject", src_bucket, Some(src_key), e) {
                // The source key is the only one that can be missing.
                S3ToolsError::NoSuchBucket { .. } => S3ToolsError::NoSuchBucket {
                    bucket: format!("{src_bucket} or {dst_bucket}"),
                },
                other => other,
            })?;
        Ok(())
    }

    async fn create_bucket(&self, name: &str, config: Option<&BucketConfig>) -> Result<bool> {
        let mut req = self.client.create_bucket().bucket(name);
        if let Some(cfg) = config {
            if let Some(location) = &cfg.location_constraint {
                let bucket_cfg = CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(location.as_str()))
                    .build();
                req = req.create_bucket_configuration(bucket_cfg);
            }
            if let Some(acl) = &cfg.acl {
                req = req.acl(BucketCannedAcl::from(acl.as_str()));
            }
        }
        req.send()
            .await
            .map_err(|e| classify("CreateBucket", name, None, e))?;
        Ok(true)
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool> {
        match self.client.delete_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(e) => match classify("DeleteBucket", name, None, e) {
                S3ToolsError::NoSuchBucket { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify("ListBuckets", "", None, e))?;
        Ok(resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_owned))
            .collect())
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(e) => match classify("HeadBucket", name, None, e) {
                S3ToolsError::NoSuchBucket { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn presigned_url(&self, request: &PresignRequest) -> Result<String> {
        request.validate()?;
        let presign_cfg = PresigningConfig::expires_in(request.expiration)
            .map_err(|e| S3ToolsError::InvalidArgument(format!("presign: {e}")))?;
        let (bucket, key) = (request.bucket.as_str(), request.key.as_str());

        let presigned = match request.method {
            ClientMethod::GetObject => self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(presign_cfg)
                .await
                .map_err(|e| classify("GetObject", bucket, Some(key), e))?,
            ClientMethod::PutObject => self
                .client
                .put_object()
                .bucket(bucket)
                .key(key)
                .presigned(presign_cfg)
                .await
                .map_err(|e| classify("PutObject", bucket, None, e))?,
            ClientMethod::DeleteObject => self
                .client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .presigned(presign_cfg)
                .await
                .map_err(|e| classify("DeleteObject", bucket, None, e))?,
            ClientMethod::HeadObject => self
                .client
                .head_object()
                .bucket(bucket)
                .key(key)
                .presigned(presign_cfg)
                .await
                .map_err(|e| classify("HeadObject", bucket, Some(key), e))?,
        };
        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn offline_store() -> S3Store {
        let cfg = S3Config::default()
            .with_region("us-east-1")
            .with_endpoint("http://127.0.0.1:9")
            .with_credentials("AKIAEXAMPLE", "secret")
            .with_path_style(true);
        S3Store::connect(&cfg).await.unwrap()
    }

    #[test]
    fn copy_source_is_percent_encoded() {
        assert_eq!(encode_copy_source("b", "dir/a b+c.txt"), "b/dir/a%20b%2Bc.txt");
        assert_eq!(encode_copy_source("b", "plain/key-1_~.x"), "b/plain/key-1_~.x");
        assert_eq!(encode_copy_source("b", "café/100%.csv"), "b/caf%C3%A9/100%25.csv");
    }

    #[tokio::test]
    async fn presigning_is_local_and_carries_the_expiry() {
        let store = offline_store().await;
        let req = PresignRequest::new(ClientMethod::GetObject, "bucket", "dir/file.txt")
            .with_expiration(Duration::from_secs(120));
        let url = store.presigned_url(&req).await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:9/bucket/dir/file.txt?"));
        assert!(url.contains("X-Amz-Expires=120"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn presign_rejects_bad_requests_before_signing() {
        let store = offline_store().await;
        let req = PresignRequest::new(ClientMethod::PutObject, "bucket", "k").with_http_method("GET");
        assert!(matches!(
            store.presigned_url(&req).await,
            Err(S3ToolsError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn object_urls_use_the_endpoint() {
        let store = offline_store().await;
        assert_eq!(store.url("b", "x/y"), "http://127.0.0.1:9/b/x/y");
    }
}
