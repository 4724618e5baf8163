// src/lib.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Crate root: module tree and public re-exports.

pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod key;
pub mod listing;
pub mod local_fs;
pub mod memory_store;
pub mod object_store;
pub mod progress;
pub mod s3_client;
pub mod s3_store;
pub mod tools;

pub use batch::{count_failures, pair_keys, run_batch, BatchItem, BatchOptions, Outcome};
pub use config::S3Config;
pub use error::{Result, S3ToolsError};
pub use key::ObjectKey;
pub use listing::{list_keys, KeyFilter, ListOptions};
pub use memory_store::MemoryStore;
pub use object_store::{
    BucketConfig, ClientMethod, ListingPage, ObjectMetadata, ObjectStore, PresignRequest,
};
pub use progress::{ConsoleProgress, FnProgress, ProgressCounter, ProgressSink};
pub use s3_store::S3Store;
pub use tools::{CopyPrefixOptions, DeleteOptions, DeleteReport, DownloadPrefixOptions, KeyPair, S3Tools};
