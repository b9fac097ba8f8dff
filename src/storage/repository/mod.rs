// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend-neutral repository contracts.
//!
//! Every backend implements the same four traits. The services only ever see
//! `Arc<dyn ...>` handles gathered in a [`Repositories`] bundle, chosen once
//! at startup from [`StorageConfig::backend`].
//!
//! All methods take the caller's [`Session`]. Repositories use the session's
//! transaction when it belongs to their backend and their ambient client
//! otherwise.

#[cfg(test)]
pub(crate) mod conformance;
pub(crate) mod records;
pub(crate) mod text;

use std::sync::Arc;

use async_trait::async_trait;

use super::blob::BlobStore;
use super::ownership::OwnedResource;
use super::session::{Session, TransactionManager};
use super::{document, embedded, relational};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::models::{Diagram, DiagramItem, GistItem, Settings, Share};

/// Listing options for [`ItemRepository::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    pub offset: usize,
    pub limit: usize,
    /// List the caller's public copies instead of their private items.
    pub is_public: bool,
    /// Only bookmarked items.
    pub is_bookmark: bool,
    /// Fetch full text; otherwise text is cleared.
    pub load_text: bool,
}

impl ItemQuery {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            is_public: false,
            is_bookmark: false,
            load_text: false,
        }
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn bookmarked(mut self, is_bookmark: bool) -> Self {
        self.is_bookmark = is_bookmark;
        self
    }

    pub fn with_text(mut self, load_text: bool) -> Self {
        self.load_text = load_text;
        self
    }
}

/// A share record with its item snapshot.
#[derive(Debug, Clone)]
pub struct SharedItem {
    /// User who created the share.
    pub owner: String,
    pub item: DiagramItem,
    pub share: Share,
}

impl OwnedResource for SharedItem {
    fn owner_user_id(&self) -> &str {
        &self.owner
    }

    fn resource_name(&self) -> &'static str {
        "share"
    }
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Private copy keyed by `(user_id, item_id)`, or the public copy keyed by
    /// `item_id` alone. Text is always loaded.
    async fn find_by_id(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<DiagramItem>;

    /// Newest `updatedAt` first, then `offset`/`limit`.
    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        query: ItemQuery,
    ) -> Result<Vec<DiagramItem>>;

    /// Insert or update in place. Saving a public copy owned by another
    /// user fails with `Forbidden` before anything is written.
    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        item: &DiagramItem,
        is_public: bool,
    ) -> Result<DiagramItem>;

    /// Deleting a missing item succeeds.
    async fn delete(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<()>;
}

#[async_trait]
pub trait ShareRepository: Send + Sync {
    async fn find(&self, session: &mut Session, share_id: &str) -> Result<SharedItem>;

    /// Store `item` as a snapshot alongside the share policy.
    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        share_id: &str,
        item: &DiagramItem,
        share: &Share,
    ) -> Result<()>;

    /// Deleting a missing share succeeds; deleting another user's fails
    /// with `Forbidden`.
    async fn delete(&self, session: &mut Session, user_id: &str, share_id: &str) -> Result<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn find(&self, session: &mut Session, user_id: &str, diagram: Diagram)
        -> Result<Settings>;

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        diagram: Diagram,
        settings: &Settings,
    ) -> Result<Settings>;
}

#[async_trait]
pub trait GistRepository: Send + Sync {
    async fn find_by_id(&self, session: &mut Session, user_id: &str, gist_id: &str)
        -> Result<GistItem>;

    /// Newest `updatedAt` first.
    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GistItem>>;

    async fn save(&self, session: &mut Session, user_id: &str, gist: &GistItem)
        -> Result<GistItem>;

    async fn delete(&self, session: &mut Session, user_id: &str, gist_id: &str) -> Result<()>;
}

/// Repositories and transaction manager of one backend.
#[derive(Clone)]
pub struct Repositories {
    pub items: Arc<dyn ItemRepository>,
    pub shares: Arc<dyn ShareRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub gists: Arc<dyn GistRepository>,
    pub transactions: Arc<dyn TransactionManager>,
}

impl Repositories {
    /// Open the configured backend and blob store.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let blob = match &config.blob_store {
            Some(blob_config) => Some(BlobStore::new(blob_config).await?),
            None => None,
        };

        let repositories = match config.backend {
            StorageBackend::Document => {
                document::open(&config.data_dir, config.document_cache_capacity, blob)?
            }
            StorageBackend::Relational => relational::open(&config.database_url, blob).await?,
            StorageBackend::Embedded => {
                embedded::open(&config.data_dir.join(crate::config::EMBEDDED_DB_FILE), blob)?
            }
        };

        tracing::info!(
            backend = ?config.backend,
            blob_store = config.blob_store.is_some(),
            "storage opened"
        );
        Ok(repositories)
    }
}
