// src/memory_store.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! In-process [`ObjectStore`].
//!
//! Buckets are ordered key maps, so listings come back in lexicographic key
//! order like S3 does, and the continuation cursor is simply the last key of
//! the previous page. Used by the test-suite and for offline dry runs.
//!
//! Two knobs help observe batch behavior: a fixed per-call `latency`, and a
//! peak in-flight gauge (`peak_in_flight`) counting how many calls overlapped.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::constants::MAX_KEYS_PER_PAGE;
use crate::error::{Result, S3ToolsError};
use crate::object_store::{BucketConfig, ListingPage, ObjectMetadata, ObjectStore, PresignRequest};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    last_modified: i64,
    e_tag: String,
}

type Bucket = BTreeMap<String, StoredObject>;

#[derive(Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicU64,
}

struct InFlight<'a>(&'a Gauge);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a Gauge) -> Self {
        gauge.calls.fetch_add(1, Ordering::Relaxed);
        let now = gauge.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        gauge.peak.fetch_max(now, Ordering::AcqRel);
        InFlight(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    latency: Option<Duration>,
    gauge: Arc<Gauge>,
    endpoint: Arc<str>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            endpoint: Arc::from("memory://s3tools"),
            ..Default::default()
        }
    }

    /// Every call sleeps for `latency` before touching the maps.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of store calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::Acquire)
    }

    /// Total number of store calls made so far.
    pub fn call_count(&self) -> u64 {
        self.gauge.calls.load(Ordering::Relaxed)
    }

    /// Keys currently stored in `bucket` (sorted); empty if the bucket is missing.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        // A panic while holding the lock cannot leave a map half-updated.
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn enter(&self) -> InFlight<'_> {
        let guard = InFlight::enter(&self.gauge);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }

    fn url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}

fn no_such_bucket(bucket: &str) -> S3ToolsError {
    S3ToolsError::NoSuchBucket { bucket: bucket.to_string() }
}

fn not_found(bucket: &str, key: &str) -> S3ToolsError {
    S3ToolsError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn stored(body: Bytes) -> StoredObject {
    // Not an MD5, just a stable fingerprint of the body.
    let e_tag = format!("\"{:08x}-{}\"", crc32fast::hash(&body), body.len());
    StoredObject {
        body,
        last_modified: now_secs(),
        e_tag,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        let _g = self.enter().await;
        let buckets = self.lock();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let page_size = max_keys.clamp(1, MAX_KEYS_PER_PAGE) as usize;

        let lower = match cursor {
            Some(c) => Bound::Excluded(c.to_string()),
            None => Bound::Included(prefix.to_string()),
        };
        let mut matching = objects
            .range((lower, Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix));

        let keys: Vec<String> = matching.by_ref().take(page_size).cloned().collect();
        let more = matching.next().is_some();
        let next_cursor = if more { keys.last().cloned() } else { None };
        Ok(ListingPage { keys, next_cursor })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let _g = self.enter().await;
        let buckets = self.lock();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<String> {
        let _g = self.enter().await;
        let mut buckets = self.lock();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(key.to_string(), stored(body));
        Ok(self.url(bucket, key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let _g = self.enter().await;
        let mut buckets = self.lock();
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>> {
        let _g = self.enter().await;
        let buckets = self.lock();
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(objects.get(key).map(|o| ObjectMetadata {
            content_length: o.body.len() as u64,
            content_type: Some("binary/octet-stream".to_string()),
            e_tag: Some(o.e_tag.clone()),
            last_modified: Some(o.last_modified),
            storage_class: Some("STANDARD".to_string()),
            metadata: HashMap::new(),
        }))
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let _g = self.enter().await;
        let mut buckets = self.lock();
        let source = buckets
            .get(src_bucket)
            .ok_or_else(|| no_such_bucket(src_bucket))?
            .get(src_key)
            .cloned()
            .ok_or_else(|| not_found(src_bucket, src_key))?;
        let target = buckets
            .get_mut(dst_bucket)
            .ok_or_else(|| no_such_bucket(dst_bucket))?;
        target.insert(dst_key.to_string(), stored(source.body));
        Ok(())
    }

    async fn create_bucket(&self, name: &str, _config: Option<&BucketConfig>) -> Result<bool> {
        let _g = self.enter().await;
        let mut buckets = self.lock();
        if buckets.contains_key(name) {
            return Err(S3ToolsError::Remote {
                operation: "CreateBucket",
                code: Some("BucketAlreadyOwnedByYou".to_string()),
                message: format!("bucket {name:?} already exists"),
            });
        }
        buckets.insert(name.to_string(), Bucket::new());
        Ok(true)
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool> {
        let _g = self.enter().await;
        let mut buckets = self.lock();
        match buckets.get(name) {
            None => Ok(false),
            Some(objects) if !objects.is_empty() => Err(S3ToolsError::Remote {
                operation: "DeleteBucket",
                code: Some("BucketNotEmpty".to_string()),
                message: format!("bucket {name:?} is not empty"),
            }),
            Some(_) => {
                buckets.remove(name);
                Ok(true)
            }
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let _g = self.enter().await;
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let _g = self.enter().await;
        Ok(self.lock().contains_key(name))
    }

    async fn presigned_url(&self, request: &PresignRequest) -> Result<String> {
        request.validate()?;
        Ok(format!(
            "{}?X-Method={}&X-Expires={}",
            self.url(&request.bucket, &request.key),
            request.method.http_method(),
            request.expiration.as_secs()
        ))
    }
}
