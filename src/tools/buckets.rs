// src/tools/buckets.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use tracing::info;

use super::S3Tools;
use crate::error::Result;
use crate::listing::filter_names;
use crate::object_store::BucketConfig;

impl S3Tools {
    /// `false` when the bucket does not exist; other failures propagate.
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.store.bucket_exists(bucket).await
    }

    pub async fn create_bucket(&self, name: &str, config: Option<BucketConfig>) -> Result<bool> {
        let created = self.store.create_bucket(name, config.as_ref()).await?;
        info!("created bucket {}", name);
        Ok(created)
    }

    /// `false` if there was no such bucket.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool> {
        let deleted = self.store.delete_bucket(name).await?;
        if deleted {
            info!("deleted bucket {}", name);
        }
        Ok(deleted)
    }

    /// Bucket names, optionally narrowed by a glob.
    pub async fn list_buckets(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let names = self.store.list_buckets().await?;
        filter_names(names, filter)
    }
}
