// src/tools/read.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{norm, S3Tools};
use crate::error::Result;
use crate::key::ObjectKey;

impl S3Tools {
    pub async fn read_object_to_bytes(&self, bucket: &str, key: impl Into<ObjectKey>) -> Result<Bytes> {
        self.store.get_object(bucket, &norm(key)).await
    }

    /// Body decoded as UTF-8.
    pub async fn read_object_to_text(&self, bucket: &str, key: impl Into<ObjectKey>) -> Result<String> {
        let body = self.read_object_to_bytes(bucket, key).await?;
        Ok(String::from_utf8(body.to_vec())?)
    }

    /// Body parsed as JSON into `T`.
    pub async fn read_object_to_json<T: DeserializeOwned>(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
    ) -> Result<T> {
        let body = self.read_object_to_bytes(bucket, key).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
