// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gzip blob store for large item text (S3/local filesystem/memory).
//!
//! The store only ever moves *ciphertext*. Objects are single-stream gzip
//! with content type `application/x-gzip`.

use std::io::{Read, Write};
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};

use crate::config::BlobStoreConfig;
use crate::error::{Error, Result};

pub const GZIP_CONTENT_TYPE: &str = "application/x-gzip";

/// Handle to the configured object store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    inner: Arc<dyn ObjectStore>,
    /// The local filesystem backend cannot persist object attributes.
    supports_attributes: bool,
}

impl BlobStore {
    pub async fn new(config: &BlobStoreConfig) -> Result<Self> {
        let store = match config {
            BlobStoreConfig::Memory => Self::memory(),

            BlobStoreConfig::Local { path } => {
                tokio::fs::create_dir_all(path).await?;
                let local = LocalFileSystem::new_with_prefix(path).map_err(|e| {
                    Error::internal(format!("invalid local blob store {}: {e}", path.display()))
                })?;
                Self {
                    inner: Arc::new(local),
                    supports_attributes: false,
                }
            }

            BlobStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let s3 = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region)
                    .with_allow_http(endpoint.starts_with("http://"))
                    .build()
                    .map_err(|e| Error::internal(format!("invalid S3 blob store: {e}")))?;
                Self {
                    inner: Arc::new(s3),
                    supports_attributes: true,
                }
            }
        };
        Ok(store)
    }

    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            supports_attributes: true,
        }
    }

    /// Compress `text` and write it under `name`.
    pub async fn put(&self, name: &str, text: &str) -> Result<()> {
        let payload = PutPayload::from(compress(text)?);
        let mut options = PutOptions::default();
        if self.supports_attributes {
            let mut attributes = Attributes::new();
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(GZIP_CONTENT_TYPE),
            );
            options.attributes = attributes;
        }
        self.inner
            .put_opts(&ObjectPath::from(name), payload, options)
            .await?;
        tracing::debug!(object = name, "blob written");
        Ok(())
    }

    /// Read and decompress the object under `name`.
    pub async fn get(&self, name: &str) -> Result<String> {
        let bytes = self
            .inner
            .get(&ObjectPath::from(name))
            .await?
            .bytes()
            .await?;
        decompress(&bytes)
    }

    /// Remove the object under `name`. Missing objects are not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        match self.inner.delete(&ObjectPath::from(name)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub(crate) async fn content_type(&self, name: &str) -> Result<Option<String>> {
        let result = self.inner.get(&ObjectPath::from(name)).await?;
        Ok(result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref().to_string()))
    }
}

fn compress(text: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

fn decompress(bytes: &[u8]) -> Result<String> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| Error::internal(format!("corrupt blob: {e}")))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::paths;

    #[tokio::test]
    async fn put_get_delete() {
        let store = BlobStore::memory();
        let name = paths::user_item_blob("u1", "i1").unwrap();

        store.put(&name, "cafebabe").await.unwrap();
        assert_eq!(store.get(&name).await.unwrap(), "cafebabe");
        assert_eq!(
            store.content_type(&name).await.unwrap().as_deref(),
            Some(GZIP_CONTENT_TYPE)
        );

        store.delete(&name).await.unwrap();
        assert!(store.get(&name).await.unwrap_err().is_not_found());
        store.delete(&name).await.unwrap();
    }

    #[tokio::test]
    async fn objects_are_gzip() {
        let store = BlobStore::memory();
        store.put("public/i1.txt.gz", "payload").await.unwrap();
        let raw = store
            .inner
            .get(&ObjectPath::from("public/i1.txt.gz"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(&BlobStoreConfig::Local {
            path: dir.path().join("blobs"),
        })
        .await
        .unwrap();

        let name = paths::share_item_blob("s1", "i1").unwrap();
        store.put(&name, "0011").await.unwrap();
        assert_eq!(store.get(&name).await.unwrap(), "0011");
        assert!(dir.path().join("blobs/shares/s1/i1.txt.gz").exists());
    }

    #[test]
    fn corrupt_blob_is_internal() {
        let err = decompress(b"not gzip").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
