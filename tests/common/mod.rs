// tests/common/mod.rs
//
// Shared fixtures for the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use s3tools::{MemoryStore, ObjectStore, S3Tools};
use std::sync::Arc;
use std::time::Duration;

pub const BUCKET: &str = "test-bucket";

/// A memory store with `BUCKET` created and `keys` written (body = key).
pub async fn seeded_store(keys: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_bucket(BUCKET, None).await.expect("create bucket");
    for key in keys {
        store
            .put_object(BUCKET, key, Bytes::copy_from_slice(key.as_bytes()))
            .await
            .expect("seed object");
    }
    store
}

/// Same as [`seeded_store`], but every store call sleeps a little.
pub async fn slow_store(keys: &[&str]) -> MemoryStore {
    let store = seeded_store(keys).await;
    store.with_latency(Duration::from_millis(5))
}

pub fn tools_for(store: &MemoryStore) -> S3Tools {
    S3Tools::with_store(Arc::new(store.clone()))
}

pub fn sorted<T: Ord>(mut v: Vec<T>) -> Vec<T> {
    v.sort();
    v
}
