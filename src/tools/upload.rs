// src/tools/upload.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Local files to object keys.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::{norm, S3Tools};
use crate::batch::{run_batch, BatchItem, BatchOptions};
use crate::error::{Result, S3ToolsError};
use crate::key::ObjectKey;
use crate::local_fs::enumerate_files;

impl S3Tools {
    /// Upload one file; returns the object URL.
    pub async fn upload_file_to_key(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        path: impl AsRef<Path>,
    ) -> Result<String> {
        let key = norm(key);
        let path = path.as_ref();
        debug!("uploading {:?} to s3://{}/{}", path, bucket, key);
        self.store.put_file(bucket, &key, path).await
    }

    /// Upload each `(path, key)` pair. The success value is the object URL.
    pub async fn upload_files_to_keys<P, K>(
        &self,
        bucket: &str,
        paths_keys: Vec<(P, K)>,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<(PathBuf, String), String>>>
    where
        P: Into<PathBuf>,
        K: Into<ObjectKey>,
    {
        let units: Vec<(PathBuf, String)> = paths_keys
            .into_iter()
            .map(|(p, k)| (p.into(), norm(k)))
            .collect();

        let store = self.store.clone();
        let bucket: Arc<str> = Arc::from(bucket);
        run_batch("upload", units, options, move |(path, key)| {
            let store = store.clone();
            let bucket = bucket.clone();
            async move { store.put_file(&bucket, &key, &path).await }
        })
        .await
    }

    /// Upload every file below `folder` matching `search_str` (recursively),
    /// keeping the relative folder structure under `prefix`.
    ///
    /// An empty folder (or no match) uploads nothing and returns an empty list.
    pub async fn upload_folder_to_prefix(
        &self,
        bucket: &str,
        prefix: impl Into<ObjectKey>,
        folder: impl AsRef<Path>,
        search_str: &str,
        options: &BatchOptions,
    ) -> Result<Vec<BatchItem<(PathBuf, String), String>>> {
        let folder = folder.as_ref().to_path_buf();
        let prefix: ObjectKey = prefix.into();

        let walk_root = folder.clone();
        let pattern = search_str.to_string();
        let files = tokio::task::spawn_blocking(move || enumerate_files(&walk_root, &pattern)).await??;

        let mut units = Vec::with_capacity(files.len());
        for path in files {
            let rel = path.strip_prefix(&folder).map_err(|_| {
                S3ToolsError::InvalidArgument(format!(
                    "{} is not below {}",
                    path.display(),
                    folder.display()
                ))
            })?;
            let key = prefix.join(rel).into_string();
            units.push((path, key));
        }

        if units.is_empty() {
            info!("no files matching {:?} under {}", search_str, folder.display());
            return Ok(Vec::new());
        }
        self.upload_files_to_keys(bucket, units, options).await
    }
}
