// src/listing.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Key enumeration: follow the listing cursor to the end, then filter.
//!
//! Filters use shell-glob semantics over the full key string (`*`, `?`,
//! `[seq]`, `[!seq]`). `*` also matches `/`, so `*x.txt` matches keys in any
//! "directory".

use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::constants::DEFAULT_MAX_KEYS;
use crate::error::{Result, S3ToolsError};
use crate::object_store::ObjectStore;

const KEY_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled key filter.
#[derive(Debug, Clone)]
pub struct KeyFilter(Pattern);

impl KeyFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Pattern::new(pattern)
            .map(KeyFilter)
            .map_err(|source| S3ToolsError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Compile an optional pattern; `None` means "keep everything".
    pub fn optional(pattern: Option<&str>) -> Result<Option<Self>> {
        pattern.map(KeyFilter::new).transpose()
    }

    pub fn matches(&self, key: &str) -> bool {
        self.0.matches_with(key, KEY_MATCH)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Options for a listing call.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Glob applied to full keys after all pages are collected.
    pub filter: Option<String>,
    /// Page-size hint; does not change the result.
    pub max_keys: i32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            filter: None,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl ListOptions {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_max_keys(mut self, max_keys: i32) -> Self {
        self.max_keys = max_keys;
        self
    }
}

/// Every key under `prefix`, in discovery order, optionally filtered.
///
/// An empty prefix lists the whole bucket; no matches is an empty vector.
/// Store errors (a missing bucket included) are returned as they come.
pub async fn list_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    options: &ListOptions,
) -> Result<Vec<String>> {
    // Bad patterns fail before any remote call.
    let filter = KeyFilter::optional(options.filter.as_deref())?;
    if options.max_keys <= 0 {
        return Err(S3ToolsError::InvalidArgument(format!(
            "max_keys must be positive, got {}",
            options.max_keys
        )));
    }

    let mut keys = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = store
            .list_page(bucket, prefix, options.max_keys, cursor.as_deref())
            .await?;
        pages += 1;
        debug!(
            "listing s3://{}/{}: page {} returned {} keys",
            bucket,
            prefix,
            pages,
            page.keys.len()
        );
        keys.extend(page.keys);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    if let Some(filter) = filter {
        keys.retain(|k| filter.matches(k));
    }
    Ok(keys)
}

/// Keep the names matching `filter` (all when `None`).
pub fn filter_names(names: Vec<String>, filter: Option<&str>) -> Result<Vec<String>> {
    match KeyFilter::optional(filter)? {
        Some(f) => Ok(names.into_iter().filter(|n| f.matches(n)).collect()),
        None => Ok(names),
    }
}
