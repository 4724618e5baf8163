// src/tools/presign.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use std::time::Duration;

use super::{norm, S3Tools};
use crate::error::Result;
use crate::key::ObjectKey;
use crate::object_store::{ClientMethod, PresignRequest};

impl S3Tools {
    /// Presigned URL for an arbitrary request. Parameters are validated first.
    pub async fn get_presigned_url(&self, request: PresignRequest) -> Result<String> {
        let request = PresignRequest {
            key: norm(request.key.as_str()),
            ..request
        };
        request.validate()?;
        self.store.presigned_url(&request).await
    }

    /// Presigned GET.
    pub async fn get_presigned_download_url(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        expiration: Duration,
    ) -> Result<String> {
        let request = PresignRequest::new(ClientMethod::GetObject, bucket, norm(key)).with_expiration(expiration);
        self.get_presigned_url(request).await
    }

    /// Presigned PUT; the holder can upload the object body directly.
    pub async fn get_presigned_upload_url(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        expiration: Duration,
    ) -> Result<String> {
        let request = PresignRequest::new(ClientMethod::PutObject, bucket, norm(key)).with_expiration(expiration);
        self.get_presigned_url(request).await
    }
}
