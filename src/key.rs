// src/key.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Normalized object keys.
//!
//! Callers hand keys over as strings or paths; both are turned into an
//! [`ObjectKey`] exactly once, at the API boundary, and everything behind that
//! boundary works on the normalized string only.
//!
//! Normalization follows POSIX path rules:
//! * repeated `/` collapse to one,
//! * `.` segments are dropped,
//! * a trailing `/` is dropped,
//! * a leading `/` is kept.
//!
//! An empty input stays empty (the whole bucket, when used as a prefix).

use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(raw: &str) -> Self {
        ObjectKey(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a relative key below this one (`a/b` + `c/d` -> `a/b/c/d`).
    pub fn join(&self, rel: impl Into<ObjectKey>) -> ObjectKey {
        let rel = rel.into();
        if self.is_empty() {
            return rel;
        }
        ObjectKey::new(&format!("{}/{}", self.0, rel.0))
    }

    /// Last path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

fn normalize(raw: &str) -> String {
    let joined = raw
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/");
    if raw.starts_with('/') { format!("/{joined}") } else { joined }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectKey {
    fn from(s: &str) -> Self {
        ObjectKey::new(s)
    }
}

impl From<String> for ObjectKey {
    fn from(s: String) -> Self {
        ObjectKey::new(&s)
    }
}

impl From<&String> for ObjectKey {
    fn from(s: &String) -> Self {
        ObjectKey::new(s)
    }
}

impl From<&ObjectKey> for ObjectKey {
    fn from(k: &ObjectKey) -> Self {
        k.clone()
    }
}

// Paths go through `components()` so platform separators become `/`.
impl From<&Path> for ObjectKey {
    fn from(p: &Path) -> Self {
        let mut absolute = false;
        let mut parts: Vec<String> = Vec::new();
        for c in p.components() {
            match c {
                Component::RootDir => absolute = true,
                Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => parts.push("..".to_string()),
                Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
            }
        }
        let joined = parts.join("/");
        ObjectKey(if absolute { format!("/{joined}") } else { joined })
    }
}

impl From<PathBuf> for ObjectKey {
    fn from(p: PathBuf) -> Self {
        ObjectKey::from(p.as_path())
    }
}

impl From<&PathBuf> for ObjectKey {
    fn from(p: &PathBuf) -> Self {
        ObjectKey::from(p.as_path())
    }
}

impl From<ObjectKey> for String {
    fn from(k: ObjectKey) -> Self {
        k.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_normalize_like_posix_paths() {
        assert_eq!(ObjectKey::from("prefix/key.csv/").as_str(), "prefix/key.csv");
        assert_eq!(ObjectKey::from("a//b/./c").as_str(), "a/b/c");
        assert_eq!(ObjectKey::from("./a").as_str(), "a");
        assert_eq!(ObjectKey::from("/a/b").as_str(), "/a/b");
        assert_eq!(ObjectKey::from("").as_str(), "");
    }

    #[test]
    fn paths_and_strings_agree() {
        let from_path = ObjectKey::from(Path::new("myFiles/photo.jpg"));
        let from_str = ObjectKey::from("myFiles/photo.jpg");
        assert_eq!(from_path, from_str);
        assert_eq!(ObjectKey::from(PathBuf::from("x/y/")), ObjectKey::from("x/y"));
    }

    #[test]
    fn join_and_file_name() {
        let prefix = ObjectKey::from("backup/");
        assert_eq!(prefix.join("data/a.json").as_str(), "backup/data/a.json");
        assert_eq!(ObjectKey::default().join("a").as_str(), "a");
        assert_eq!(ObjectKey::from("a/b.txt").file_name(), Some("b.txt"));
        assert_eq!(ObjectKey::default().file_name(), None);
    }
}
