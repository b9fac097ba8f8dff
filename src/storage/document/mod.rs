// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Store Backend
//!
//! Collections of JSON documents under one directory:
//!
//! ```text
//! <DATA_DIR>/
//!   users/{uid}/
//!     items/{item_id}.json        # private items
//!     settings/{diagram}.json     # display settings
//!     gists/{gist_id}.json        # gist bookmarks
//!   public_items/{item_id}.json   # public copies (with owner uid)
//!   share_items/{share_id}.json   # share policy + item snapshot
//! ```
//!
//! Parsed documents are kept in a bounded LRU read cache; writes and deletes
//! invalidate the affected entry.

mod items;
mod settings;
mod shares;
mod store;

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

pub use items::DocumentItemRepository;
pub use settings::{DocumentGistRepository, DocumentSettingsRepository};
pub use shares::DocumentShareRepository;
pub use store::{DocumentStore, DocumentTransaction};

use super::blob::BlobStore;
use super::repository::Repositories;
use super::session::{foreign_session, ActiveTransaction, Session, TransactionManager};
use crate::error::Result;

/// Sessions whose writes are staged and applied on commit.
pub struct DocumentTransactions {
    store: Arc<DocumentStore>,
}

impl DocumentTransactions {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionManager for DocumentTransactions {
    async fn begin(&self) -> Result<Session> {
        Ok(Session::with(ActiveTransaction::Document(
            DocumentTransaction::default(),
        )))
    }

    async fn commit(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Document(tx)) => self.store.apply(tx),
            Some(other) => Err(foreign_session("document", &other)),
        }
    }

    async fn rollback(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Document(tx)) => {
                tracing::debug!(discarded = tx.len(), "document transaction discarded");
                Ok(())
            }
            Some(other) => Err(foreign_session("document", &other)),
        }
    }
}

/// Open the document backend rooted at `root`.
pub fn open(
    root: &Path,
    cache_capacity: NonZeroUsize,
    blob: Option<BlobStore>,
) -> Result<Repositories> {
    let store = Arc::new(DocumentStore::open(root, cache_capacity)?);
    Ok(Repositories {
        items: Arc::new(DocumentItemRepository::new(store.clone(), blob.clone())),
        shares: Arc::new(DocumentShareRepository::new(store.clone(), blob)),
        settings: Arc::new(DocumentSettingsRepository::new(store.clone())),
        gists: Arc::new(DocumentGistRepository::new(store.clone())),
        transactions: Arc::new(DocumentTransactions::new(store)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::conformance;

    fn repositories(dir: &tempfile::TempDir, blob: Option<BlobStore>) -> Repositories {
        open(dir.path(), NonZeroUsize::new(16).unwrap(), blob).unwrap()
    }

    #[tokio::test]
    async fn item_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::items(&repositories(&dir, None)).await;
    }

    #[tokio::test]
    async fn item_contract_with_blob_store() {
        let dir = tempfile::tempdir().unwrap();
        let blob = BlobStore::memory();
        conformance::items_with_blob(&repositories(&dir, Some(blob.clone())), &blob).await;
    }

    #[tokio::test]
    async fn share_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::shares(&repositories(&dir, Some(BlobStore::memory()))).await;
    }

    #[tokio::test]
    async fn settings_and_gist_contract() {
        let dir = tempfile::tempdir().unwrap();
        let repos = repositories(&dir, None);
        conformance::settings(&repos).await;
        conformance::gists(&repos).await;
    }

    #[tokio::test]
    async fn transaction_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::transactions(&repositories(&dir, None)).await;
    }

    #[tokio::test]
    async fn items_are_plain_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let repos = repositories(&dir, None);
        let item = conformance::sample_item("doc-1");
        repos
            .items
            .save(&mut Session::ambient(), "user-1", &item, false)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("users/user-1/items/doc-1.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["uid"], "user-1");
        assert_eq!(value["diagram"], "MIND_MAP");
        assert_eq!(value["text"], item.encrypted_text());
    }
}
