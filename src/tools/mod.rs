// src/tools/mod.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! The `S3Tools` handle and every user-facing operation.
//!
//! Each submodule adds one group of methods to [`S3Tools`]. All of them go
//! through the handle's [`ObjectStore`], so the same code drives real S3 and
//! the in-memory store.

use std::sync::Arc;

use crate::config::S3Config;
use crate::error::Result;
use crate::key::ObjectKey;
use crate::object_store::ObjectStore;
use crate::s3_store::S3Store;

mod buckets;
mod check;
mod copy;
mod delete;
mod download;
mod list;
mod mv;
mod presign;
mod read;
mod upload;
mod write;

pub use copy::{CopyPrefixOptions, KeyPair};
pub use delete::{DeleteOptions, DeleteReport};
pub use download::DownloadPrefixOptions;

/// Entry point: one store, shared by every operation on this handle.
#[derive(Clone)]
pub struct S3Tools {
    store: Arc<dyn ObjectStore>,
}

impl S3Tools {
    /// Build an S3-backed handle from `config`.
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let store = S3Store::connect(config).await?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Use any store implementation (e.g. [`crate::MemoryStore`]).
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

/// Normalize a caller-supplied key once, at the boundary.
pub(crate) fn norm(key: impl Into<ObjectKey>) -> String {
    key.into().into_string()
}
