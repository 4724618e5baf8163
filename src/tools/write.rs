// src/tools/write.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use super::{norm, S3Tools};
use crate::error::{Result, S3ToolsError};
use crate::key::ObjectKey;

impl S3Tools {
    /// Store `data` under `key`; returns the object URL.
    pub async fn write_object_from_bytes(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        data: impl Into<Bytes>,
    ) -> Result<String> {
        let key = norm(key);
        let data = data.into();
        debug!("writing {} bytes to s3://{}/{}", data.len(), bucket, key);
        self.store.put_object(bucket, &key, data).await
    }

    pub async fn write_object_from_text(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        text: &str,
    ) -> Result<String> {
        self.write_object_from_bytes(bucket, key, Bytes::copy_from_slice(text.as_bytes()))
            .await
    }

    /// Serialize `data` as JSON. Only values that serialize to a JSON object are accepted.
    pub async fn write_object_from_json<T: Serialize + ?Sized>(
        &self,
        bucket: &str,
        key: impl Into<ObjectKey>,
        data: &T,
    ) -> Result<String> {
        let value = serde_json::to_value(data)?;
        if !value.is_object() {
            return Err(S3ToolsError::InvalidArgument(
                "object data must serialize to a JSON object".into(),
            ));
        }
        let body = serde_json::to_vec(&value)?;
        self.write_object_from_bytes(bucket, key, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::object_store::ObjectStore;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    async fn tools() -> S3Tools {
        let store = MemoryStore::new();
        store.create_bucket("b", None).await.unwrap();
        S3Tools::with_store(Arc::new(store))
    }

    #[tokio::test]
    async fn text_and_json_round_trip() {
        let tools = tools().await;
        let url = tools.write_object_from_text("b", "dir//notes.txt", "héllo").await.unwrap();
        assert!(url.ends_with("/b/dir/notes.txt"));
        assert_eq!(tools.read_object_to_text("b", "dir/notes.txt").await.unwrap(), "héllo");

        let mut doc = BTreeMap::new();
        doc.insert("name".to_string(), 3);
        tools.write_object_from_json("b", "doc.json", &doc).await.unwrap();
        let back: BTreeMap<String, i32> = tools.read_object_to_json("b", "doc.json").await.unwrap();
        assert_eq!(back, doc);
    }

    #[tokio::test]
    async fn non_object_json_is_rejected() {
        let tools = tools().await;
        let err = tools.write_object_from_json("b", "list.json", &vec![1, 2]).await.unwrap_err();
        assert!(matches!(err, S3ToolsError::InvalidArgument(_)));
        assert!(!tools.object_exists("b", "list.json").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_utf8_is_reported() {
        let tools = tools().await;
        tools.write_object_from_bytes("b", "bin", vec![0xff, 0xfe]).await.unwrap();
        assert!(matches!(
            tools.read_object_to_text("b", "bin").await,
            Err(S3ToolsError::Utf8(_))
        ));
    }
}
