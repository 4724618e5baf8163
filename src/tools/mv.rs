// src/tools/mv.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Moves are a copy followed by a delete of the source. There is no rollback:
//! if the delete fails after a successful copy, both keys exist.

use super::copy::{CopyPrefixOptions, KeyPair};
use super::{norm, S3Tools};
use crate::batch::{pair_keys, BatchItem, BatchOptions};
use crate::error::Result;
use crate::key::ObjectKey;

impl S3Tools {
    pub async fn move_object(
        &self,
        source_bucket: &str,
        source_key: impl Into<ObjectKey>,
        destination_bucket: &str,
        destination_key: impl Into<ObjectKey>,
    ) -> Result<()> {
        let src = norm(source_key);
        self.store
            .copy_object(source_bucket, &src, destination_bucket, &norm(destination_key))
            .await?;
        self.store.delete_object(source_bucket, &src).await
    }

    pub async fn move_keys<S, D>(
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
        self.run_pairs("move", source_bucket, destination_bucket, pairs, true, options)
            .await
    }

    /// Move every key under `source_prefix`; no matching keys is an `EmptyBatch`.
    pub async fn move_prefix(
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
        self.run_pairs("move", source_bucket, destination_bucket, pairs, true, options)
            .await
    }
}
