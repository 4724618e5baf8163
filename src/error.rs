// src/error.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Error taxonomy shared by every s3tools operation.
//!
//! Three families live here:
//! * structural errors (`LengthMismatch`, `EmptyBatch`, `InvalidArgument`,
//!   `InvalidPattern`) raised before any remote call is made,
//! * remote errors (`NoSuchBucket`, `NotFound`, `Remote`) carrying the store's
//!   own classification,
//! * local errors (`Io`, `Json`, `Utf8`, `Config`, `Join`).

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = S3ToolsError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum S3ToolsError {
    #[error("key lists must have the same length (sources={sources}, destinations={destinations})")]
    LengthMismatch { sources: usize, destinations: usize },

    #[error("key list length must be greater than zero")]
    EmptyBatch,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("NoSuchBucket: the bucket {bucket:?} does not exist")]
    NoSuchBucket { bucket: String },

    #[error("404: object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("{operation} failed ({}): {message}", code.as_deref().unwrap_or("no error code"))]
    Remote {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Join(String),
}

impl S3ToolsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        S3ToolsError::Io { path: path.into(), source }
    }

    /// True for "the object (or its bucket) is not there" errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, S3ToolsError::NotFound { .. } | S3ToolsError::NoSuchBucket { .. })
    }

    /// True for errors raised before any remote call was attempted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            S3ToolsError::LengthMismatch { .. }
                | S3ToolsError::EmptyBatch
                | S3ToolsError::InvalidArgument(_)
                | S3ToolsError::InvalidPattern { .. }
        )
    }

    /// The store's error code when one is known (`NoSuchBucket`, `404`, `AccessDenied`, ...).
    pub fn code(&self) -> Option<&str> {
        match self {
            S3ToolsError::NoSuchBucket { .. } => Some("NoSuchBucket"),
            S3ToolsError::NotFound { .. } => Some("404"),
            S3ToolsError::Remote { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for S3ToolsError {
    fn from(e: tokio::task::JoinError) -> Self {
        S3ToolsError::Join(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_classification() {
        let e = S3ToolsError::NoSuchBucket { bucket: "b".into() };
        assert_eq!(e.code(), Some("NoSuchBucket"));
        assert!(e.is_not_found());

        let e = S3ToolsError::Remote {
            operation: "PutObject",
            code: Some("AccessDenied".into()),
            message: "denied".into(),
        };
        assert_eq!(e.code(), Some("AccessDenied"));
        assert!(!e.is_not_found());
        assert_eq!(e.to_string(), "PutObject failed (AccessDenied): denied");
    }

    #[test]
    fn precondition_errors() {
        assert!(S3ToolsError::EmptyBatch.is_precondition());
        assert!(S3ToolsError::LengthMismatch { sources: 1, destinations: 2 }.is_precondition());
        assert!(!S3ToolsError::Config("x".into()).is_precondition());
    }
}
