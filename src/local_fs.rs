// src/local_fs.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Local filesystem side of uploads and downloads.

use bytes::Bytes;
use glob::{MatchOptions, glob_with};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, S3ToolsError};

/// Read a whole file; fails if it does not exist.
pub async fn read_all_bytes(path: &Path) -> Result<Bytes> {
    let data = fs::read(path).await.map_err(|e| S3ToolsError::io(path, e))?;
    Ok(Bytes::from(data))
}

/// Write `data` to `path`, creating parent directories as needed.
pub async fn write_all_bytes(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| S3ToolsError::io(parent, e))?;
    }
    fs::write(path, data).await.map_err(|e| S3ToolsError::io(path, e))
}

/// Every regular file below `root` (at any depth) whose name matches `pattern`.
///
/// `pattern` may itself contain `/` (`data/*.json`), in which case it is
/// matched against the path relative to any directory under `root`, the way
/// a recursive glob does. Results are sorted.
pub fn enumerate_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(S3ToolsError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "folder does not exist"),
        ));
    }

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let full = format!("{}/**/{}", escaped_root.trim_end_matches('/'), pattern);
    debug!("enumerating local files with {}", full);

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let entries = glob_with(&full, options).map_err(|source| S3ToolsError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable path during folder walk: {}", e),
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_creates_parents_and_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/c.txt");
        write_all_bytes(&target, b"hello").await.unwrap();
        assert_eq!(read_all_bytes(&target).await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn reading_a_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_all_bytes(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, S3ToolsError::Io { .. }));
    }

    #[tokio::test]
    async fn enumerate_is_recursive_and_filtered() {
        let dir = TempDir::new().unwrap();
        for rel in ["top.json", "sub/inner.json", "sub/deeper/x.json", "sub/skip.txt"] {
            write_all_bytes(&dir.path().join(rel), b"{}").await.unwrap();
        }

        let all = enumerate_files(dir.path(), "*").unwrap();
        assert_eq!(all.len(), 4);

        let json = enumerate_files(dir.path(), "*.json").unwrap();
        let names: Vec<_> = json
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["sub/deeper/x.json", "sub/inner.json", "top.json"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(enumerate_files(Path::new("/definitely/not/here/s3tools"), "*").is_err());
    }
}
