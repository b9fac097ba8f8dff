// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Embedded Backend
//!
//! A single redb file (`<DATA_DIR>/diagrams.redb`) holding JSON records in
//! five tables: `items`, `public_items`, `share_items`, `settings` and
//! `gist_items`. Record shapes match the document backend.
//!
//! A session holds the database's write transaction and the store's writer
//! permit. redb admits one writer at a time, so ambient writes and new
//! sessions from other tasks wait asynchronously until it commits or rolls
//! back.

mod items;
mod settings;
mod shares;
mod store;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

pub use items::EmbeddedItemRepository;
pub use settings::{EmbeddedGistRepository, EmbeddedSettingsRepository};
pub use shares::EmbeddedShareRepository;
pub use store::{EmbeddedStore, EmbeddedTransaction};

use super::blob::BlobStore;
use super::repository::Repositories;
use super::session::{foreign_session, ActiveTransaction, Session, TransactionManager};
use crate::error::Result;

/// Sessions backed by one redb write transaction.
pub struct EmbeddedTransactions {
    store: Arc<EmbeddedStore>,
}

impl EmbeddedTransactions {
    pub fn new(store: Arc<EmbeddedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionManager for EmbeddedTransactions {
    async fn begin(&self) -> Result<Session> {
        Ok(Session::with(ActiveTransaction::Embedded(
            self.store.begin().await?,
        )))
    }

    async fn commit(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Embedded(tx)) => tx.commit(),
            Some(other) => Err(foreign_session("embedded", &other)),
        }
    }

    async fn rollback(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Embedded(tx)) => tx.abort(),
            Some(other) => Err(foreign_session("embedded", &other)),
        }
    }
}

/// Open the embedded backend stored at `path`.
pub fn open(path: &Path, blob: Option<BlobStore>) -> Result<Repositories> {
    let store = Arc::new(EmbeddedStore::open(path)?);
    Ok(Repositories {
        items: Arc::new(EmbeddedItemRepository::new(store.clone(), blob.clone())),
        shares: Arc::new(EmbeddedShareRepository::new(store.clone(), blob)),
        settings: Arc::new(EmbeddedSettingsRepository::new(store.clone())),
        gists: Arc::new(EmbeddedGistRepository::new(store.clone())),
        transactions: Arc::new(EmbeddedTransactions::new(store)),
    })
}
