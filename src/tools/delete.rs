// src/tools/delete.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use std::sync::Arc;
use tracing::info;

use super::{norm, S3Tools};
use crate::batch::{run_batch, BatchItem, BatchOptions};
use crate::error::Result;
use crate::key::ObjectKey;
use crate::listing::{list_keys, ListOptions};

/// Settings for bulk deletes.
#[derive(Debug, Clone)]
pub struct DeleteOptions {
    /// Only report what would be deleted. On by default.
    pub dry_run: bool,
    pub batch: BatchOptions,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            batch: BatchOptions::default(),
        }
    }
}

impl DeleteOptions {
    /// Actually delete.
    pub fn execute() -> Self {
        Self {
            dry_run: false,
            ..Default::default()
        }
    }

    pub fn with_batch(mut self, batch: BatchOptions) -> Self {
        self.batch = batch;
        self
    }
}

/// What a bulk delete did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReport {
    /// Keys that would have been deleted.
    DryRun(Vec<String>),
    Deleted(Vec<BatchItem<String, ()>>),
}

impl DeleteReport {
    /// Keys the report covers, whatever their outcome.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            DeleteReport::DryRun(keys) => keys.iter().map(String::as_str).collect(),
            DeleteReport::Deleted(items) => items.iter().map(|i| i.identity.as_str()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DeleteReport::DryRun(keys) => keys.is_empty(),
            DeleteReport::Deleted(items) => items.is_empty(),
        }
    }
}

impl S3Tools {
    /// Delete one key. Deleting an absent key succeeds.
    pub async fn delete_object(&self, bucket: &str, key: impl Into<ObjectKey>) -> Result<()> {
        self.store.delete_object(bucket, &norm(key)).await
    }

    /// Delete each key in `keys` (or just list them on a dry run).
    /// An empty key list deletes nothing and is not an error.
    pub async fn delete_keys<K>(
        &self,
        bucket: &str,
        keys: impl IntoIterator<Item = K>,
        options: &DeleteOptions,
    ) -> Result<DeleteReport>
    where
        K: Into<ObjectKey>,
    {
        let keys: Vec<String> = keys.into_iter().map(norm).collect();
        if options.dry_run {
            info!("dry run: {} key(s) would be deleted from {}", keys.len(), bucket);
            return Ok(DeleteReport::DryRun(keys));
        }

        if keys.is_empty() {
            return Ok(DeleteReport::Deleted(Vec::new()));
        }

        let store = self.store.clone();
        let bucket: Arc<str> = Arc::from(bucket);
        let items = run_batch("delete", keys, &options.batch, move |key| {
            let store = store.clone();
            let bucket = bucket.clone();
            async move { store.delete_object(&bucket, &key).await }
        })
        .await?;
        Ok(DeleteReport::Deleted(items))
    }

    /// Delete every key under `prefix`. Nothing under the prefix yields an empty report.
    pub async fn delete_prefix(
        &self,
        bucket: &str,
        prefix: impl Into<ObjectKey>,
        options: &DeleteOptions,
    ) -> Result<DeleteReport> {
        let keys = list_keys(self.store.as_ref(), bucket, &norm(prefix), &ListOptions::default()).await?;
        self.delete_keys(bucket, keys, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::object_store::ObjectStore;
    use bytes::Bytes;

    async fn setup() -> (MemoryStore, S3Tools) {
        let store = MemoryStore::new();
        store.create_bucket("b", None).await.unwrap();
        for k in ["logs/1", "logs/2", "keep/3"] {
            store.put_object("b", k, Bytes::from_static(b"x")).await.unwrap();
        }
        let tools = S3Tools::with_store(Arc::new(store.clone()));
        (store, tools)
    }

    #[tokio::test]
    async fn dry_run_is_the_default_and_touches_nothing() {
        let (store, tools) = setup().await;
        let report = tools.delete_prefix("b", "logs", &DeleteOptions::default()).await.unwrap();
        assert_eq!(report, DeleteReport::DryRun(vec!["logs/1".into(), "logs/2".into()]));
        assert_eq!(store.keys("b").len(), 3);
    }

    #[tokio::test]
    async fn executed_prefix_delete_removes_only_the_prefix() {
        let (store, tools) = setup().await;
        let report = tools.delete_prefix("b", "logs/", &DeleteOptions::execute()).await.unwrap();
        let mut keys = report.keys();
        keys.sort();
        assert_eq!(keys, vec!["logs/1", "logs/2"]);
        assert_eq!(store.keys("b"), vec!["keep/3"]);
    }

    #[tokio::test]
    async fn empty_prefix_match_is_an_empty_report() {
        let (_, tools) = setup().await;
        let report = tools.delete_prefix("b", "nothing", &DeleteOptions::execute()).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn empty_key_list_is_a_no_op() {
        let (store, tools) = setup().await;
        let before = store.call_count();
        let report = tools
            .delete_keys("b", Vec::<String>::new(), &DeleteOptions::execute())
            .await
            .unwrap();
        assert_eq!(report, DeleteReport::Deleted(Vec::new()));
        assert_eq!(store.call_count(), before);
        assert_eq!(store.keys("b").len(), 3);
    }
}
