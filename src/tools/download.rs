// src/tools/download.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{norm, S3Tools};
use crate::batch::{run_batch, BatchItem, BatchOptions};
use crate::error::{Result, S3ToolsError};
use crate::key::ObjectKey;
use crate::listing::{list_keys, ListOptions};
use crate::local_fs::write_all_bytes;
use crate::object_store::ObjectStore;

/// Options for [`S3Tools::download_prefix_to_folder`].
#[derive(Debug, Clone)]
pub struct DownloadPrefixOptions {
    /// Glob over the full keys.
    pub filter: Option<String>,
    /// Drop the listed prefix from local paths (default), so `data/a/b.txt`
    /// under prefix `data` lands at `<folder>/a/b.txt`.
    pub remove_prefix: bool,
}

impl Default for DownloadPrefixOptions {
    fn default() -> Self {
        Self {
            filter: None,
            remove_prefix: true,
        }
    }
}

impl DownloadPrefixOptions {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn keep_prefix(mut self) -> Self {
        self.remove_prefix = false;
        self
    }
}

async fn fetch_to_file(store: &dyn ObjectStore, bucket: &str, key: &str, path: &Path) -> Result<()> {
    let body = store.get_object(bucket, key).await?;
    write_all_bytes(path, &body).await?;
    debug!("s3://{}/{} -> {:?} ({} bytes)", bucket, key, path, body.len());
    Ok(())
}

/// Local path for `key` below `folder`.
fn local_path_for(folder: &Path, prefix: &str, key: &str, remove_prefix: bool) -> PathBuf {
    let rel = if remove_prefix {
        key.strip_prefix(prefix).unwrap_or(key).trim_start_matches('/')
    } else {
        key
    };
    folder.join(rel.trim_start_matches('/'))
}

/// Reject paths that climb out of `folder` through `..` segments.
fn ensure_inside(folder: &Path, path: &Path) -> Result<()> {
    let escapes = match path.strip_prefix(folder) {
        Ok(rel) => rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)),
        Err(_) => true,
    };
    if escapes {
        return Err(S3ToolsError::InvalidArgument(format!(
            "{} resolves outside {}",
            path.display(),
            folder.display()
        )));
    }
    Ok(())
}

impl S3Tools {
    /// Download one object, creating parent directories.
    /// Returns whether the file exists afterwards.
    pub async fn download_key_to_file(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        path: impl AsRef<Path>,
    ) -> Result<bool> {
        let path = path.as_ref();
        fetch_to_file(self.store.as_ref(), bucket, &norm(key), path).await?;
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }

    /// Download each `(key, path)` pair.
    pub async fn download_keys_to_files<K, P>(
        &self,
        bucket: &str,
        keys_paths: Vec<(K, P)>,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<(String, PathBuf), ()>>>
    where
        K: Into<ObjectKey>,
        P: Into<PathBuf>,
    {
        let units: Vec<(String, PathBuf)> = keys_paths
            .into_iter()
            .map(|(k, p)| (norm(k), p.into()))
            .collect();

        let store = self.store.clone();
        let bucket: Arc<str> = Arc::from(bucket);
        run_batch("download", units, options, move |(key, path)| {
            let store = store.clone();
            let bucket = bucket.clone();
            async move { fetch_to_file(store.as_ref(), &bucket, &key, &path).await }
        })
        .await
    }

    /// Download every key under `prefix` into `folder`, recreating the key
    /// "directories" locally. Nothing under the prefix returns an empty list.
    pub async fn download_prefix_to_folder(
        &self,
        bucket: &str,
        prefix: impl Into<ObjectKey>,
        folder: impl AsRef<Path>,
        prefix_options: &DownloadPrefixOptions,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<(String, PathBuf), ()>>> {
        let prefix = norm(prefix);
        let folder = folder.as_ref();
        let list_options = ListOptions {
            filter: prefix_options.filter.clone(),
            ..Default::default()
        };
        let keys = list_keys(self.store.as_ref(), bucket, &prefix, &list_options).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let units: Vec<(String, PathBuf)> = keys
            .into_iter()
            .map(|k| {
                let path = local_path_for(folder, &prefix, &k, prefix_options.remove_prefix);
                (k, path)
            })
            .collect();

        let store = self.store.clone();
        let bucket: Arc<str> = Arc::from(bucket);
        let folder: Arc<Path> = Arc::from(folder);
        run_batch("download", units, options, move |(key, path)| {
            let store = store.clone();
            let bucket = bucket.clone();
            let folder = folder.clone();
            async move {
                ensure_inside(&folder, &path)?;
                fetch_to_file(store.as_ref(), &bucket, &key, &path).await
            }
        })
        .await
    }
}
