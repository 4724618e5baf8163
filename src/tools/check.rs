// src/tools/check.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use super::{norm, S3Tools};
use crate::error::Result;
use crate::key::ObjectKey;
use crate::object_store::ObjectMetadata;

impl S3Tools {
    pub async fn object_exists(&self, bucket: &str, key: impl Into<ObjectKey>) -> Result<bool> {
        Ok(self.object_metadata(bucket, key).await?.is_some())
    }

    /// Metadata, or `None` for a missing key.
    pub async fn object_metadata(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
    ) -> Result<Option<ObjectMetadata>> {
        self.store.head_object(bucket, &norm(key)).await
    }
}
