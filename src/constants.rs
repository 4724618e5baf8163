// src/constants.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Centralized constants for s3tools to avoid hardcoded values throughout the codebase

use std::time::Duration;

/// Region used when neither the config nor the AWS provider chain yields one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default page size for prefix listings (S3 caps a page at 1000 keys)
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// Largest page a single listing call may request
pub const MAX_KEYS_PER_PAGE: i32 = 1000;

/// Default number of units a batch runs at the same time
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default lifetime of a presigned URL (5 minutes)
pub const DEFAULT_PRESIGN_EXPIRATION: Duration = Duration::from_secs(300);

/// SigV4 presigned URLs cannot outlive seven days
pub const MAX_PRESIGN_EXPIRATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Connect timeout for the SDK HTTP client
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-operation timeout for the SDK (covers the whole request, retries included)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Search pattern used when uploading a folder without an explicit one
pub const DEFAULT_UPLOAD_SEARCH: &str = "*";
