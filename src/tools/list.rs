// src/tools/list.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use super::{norm, S3Tools};
use crate::error::Result;
use crate::key::ObjectKey;
use crate::listing::{list_keys, ListOptions};

impl S3Tools {
    /// All keys under `prefix`, following pagination, then filtered.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: impl Into<ObjectKey>,
        options: &ListOptions,
    ) -> Result<Vec<String>> {
        list_keys(self.store.as_ref(), bucket, &norm(prefix), options).await
    }
}
