// src/tools/copy.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Server-side copies: single key, paired key lists, whole prefixes.

use std::sync::Arc;
use tracing::debug;

use super::{norm, S3Tools};
use crate::batch::{pair_keys, run_batch, BatchItem, BatchOptions};
use crate::error::Result;
use crate::key::ObjectKey;
use crate::listing::{list_keys, ListOptions};

/// How destination keys are derived for a prefix copy or move.
#[derive(Debug, Clone, Default)]
pub struct CopyPrefixOptions {
    /// `(from, to)`: every occurrence of `from` in a source key becomes `to`.
    /// Without it the destination key equals the source key.
    pub change_prefix: Option<(String, String)>,
    /// Glob over the full source keys.
    pub filter: Option<String>,
}

impl CopyPrefixOptions {
    pub fn with_change_prefix(mut self, from: impl Into<ObjectKey>, to: impl Into<ObjectKey>) -> Self {
        self.change_prefix = Some((norm(from), norm(to)));
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub(crate) fn destination_for(&self, source_key: &str) -> String {
        match &self.change_prefix {
            Some((from, to)) if !from.is_empty() => source_key.replace(from.as_str(), to),
            _ => source_key.to_string(),
        }
    }
}

/// One pair of a copy or move batch.
pub type KeyPair = (String, String);

impl S3Tools {
    pub async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: impl Into<ObjectKey>,
        destination_bucket: &str,
        destination_key: impl Into<ObjectKey>,
    ) -> Result<()> {
        self.store
            .copy_object(source_bucket, &norm(source_key), destination_bucket, &norm(destination_key))
            .await
    }

    /// Copy `source_keys[i]` to `destination_keys[i]` for every `i`.
    ///
    /// Unequal or empty lists are rejected before any copy starts.
    pub async fn copy_keys<S, D>(
        &self,
        source_bucket: &str,
        source_keys: Vec<S>,
        destination_bucket: &str,
        destination_keys: Vec<D>,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<KeyPair, ()>>>
    where
        S: Into<ObjectKey>,
        D: Into<ObjectKey>,
    {
        let pairs = pair_keys(source_keys, destination_keys)?
            .into_iter()
            .map(|(s, d)| (norm(s), norm(d)))
            .collect();
        self.run_pairs("copy", source_bucket, destination_bucket, pairs, false, options)
            .await
    }

    /// Copy every key under `source_prefix` into `destination_bucket`.
    ///
    /// A prefix with no matching keys is an [`EmptyBatch`](crate::S3ToolsError::EmptyBatch).
    pub async fn copy_prefix(
        &self,
        source_bucket: &str,
        source_prefix: impl Into<ObjectKey>,
        destination_bucket: &str,
        prefix_options: &CopyPrefixOptions,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<KeyPair, ()>>> {
        let pairs = self
            .prefix_pairs(source_bucket, source_prefix, prefix_options)
            .await?;
        self.run_pairs("copy", source_bucket, destination_bucket, pairs, false, options)
            .await
    }

    pub(crate) async fn prefix_pairs(
        &self,
        source_bucket: &str,
        source_prefix: impl Into<ObjectKey>,
        prefix_options: &CopyPrefixOptions,
    ) -> Result<Vec<KeyPair>> {
        let list_options = ListOptions {
            filter: prefix_options.filter.clone(),
            ..Default::default()
        };
        let keys = list_keys(self.store.as_ref(), source_bucket, &norm(source_prefix), &list_options).await?;
        Ok(keys
            .into_iter()
            .map(|k| {
                let dst = prefix_options.destination_for(&k);
                (k, dst)
            })
            .collect())
    }

    /// Copy each pair, deleting the source afterwards when `remove_source` is set.
    pub(crate) async fn run_pairs(
        &self,
        label: &str,
        source_bucket: &str,
        destination_bucket: &str,
        pairs: Vec<KeyPair>,
        remove_source: bool,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<KeyPair, ()>>> {
        let store = self.store.clone();
        let src_bucket: Arc<str> = Arc::from(source_bucket);
        let dst_bucket: Arc<str> = Arc::from(destination_bucket);

        run_batch(label, pairs, options, move |(src, dst)| {
            let store = store.clone();
            let src_bucket = src_bucket.clone();
            let dst_bucket = dst_bucket.clone();
            async move {
                store.copy_object(&src_bucket, &src, &dst_bucket, &dst).await?;
                if remove_source {
                    // A failure here leaves both copies in place.
                    store.delete_object(&src_bucket, &src).await?;
                }
                debug!("s3://{}/{} -> s3://{}/{}", src_bucket, src, dst_bucket, dst);
                Ok(())
            }
        })
        .await
    }
}
