// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::models::DiagramItem;
use crate::storage::blob::BlobStore;
use crate::storage::ownership::verify_if_present;
use crate::storage::repository::records::{item_document, parse_item_document, StoredItem};
use crate::storage::repository::text;
use crate::storage::repository::{ItemQuery, ItemRepository};
use crate::storage::session::Session;

/// Items as `users/{uid}/items/{id}.json` with public copies in `public_items/`.
pub struct DocumentItemRepository {
    store: Arc<DocumentStore>,
    blob: Option<BlobStore>,
}

impl DocumentItemRepository {
    pub fn new(store: Arc<DocumentStore>, blob: Option<BlobStore>) -> Self {
        Self { store, blob }
    }

    fn path(&self, user_id: &str, item_id: &str, is_public: bool) -> Result<PathBuf> {
        if is_public {
            self.store.paths().public_item(item_id)
        } else {
            self.store.paths().item(user_id, item_id)
        }
    }

    fn load(
        &self,
        session: &Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<Option<StoredItem>> {
        let path = self.path(user_id, item_id, is_public)?;
        self.store
            .read(session, &path)?
            .map(|doc| parse_item_document(&doc))
            .transpose()
    }
}

#[async_trait]
impl ItemRepository for DocumentItemRepository {
    async fn find_by_id(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let stored = self
            .load(session, user_id, item_id, is_public)?
            .ok_or_else(|| Error::not_found(format!("item {item_id}")))?;
        let mut item = stored.item;
        let name = text::item_blob(&stored.owner, item_id, is_public)?;
        text::load_text(self.blob.as_ref(), &name, &mut item).await?;
        Ok(item)
    }

    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        query: ItemQuery,
    ) -> Result<Vec<DiagramItem>> {
        let dir = if query.is_public {
            self.store.paths().public_items_dir()
        } else {
            self.store.paths().items_dir(user_id)?
        };

        let mut items = Vec::new();
        for doc in self.store.list(session, &dir)? {
            let stored = parse_item_document(&doc)?;
            if stored.owner == user_id {
                items.push(stored.item);
            }
        }

        let page = text::page_items(items, &query);
        text::load_texts(self.blob.as_ref(), page, query.load_text, |item| {
            text::item_blob(user_id, item.id(), query.is_public)
        })
        .await
    }

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        item: &DiagramItem,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let existing = self.load(session, user_id, item.id(), is_public)?;
        if is_public {
            verify_if_present(existing.as_ref(), user_id)?;
        }

        let stored = text::stamp(
            item,
            existing.map(|e| e.item.created_at()),
            self.blob.as_ref(),
        );
        let path = self.path(user_id, item.id(), is_public)?;
        let name = text::item_blob(user_id, item.id(), is_public)?;
        let document = item_document(user_id, &stored);

        text::write_with_text(self.blob.as_ref(), &name, &stored, async {
            self.store.write(session, path, document)
        })
        .await?;

        tracing::debug!(user_id, item_id = item.id(), is_public, "item saved");
        Ok(stored)
    }

    async fn delete(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<()> {
        if is_public {
            let existing = self.load(session, user_id, item_id, true)?;
            verify_if_present(existing.as_ref(), user_id)?;
        }

        let path = self.path(user_id, item_id, is_public)?;
        let name = text::item_blob(user_id, item_id, is_public)?;
        text::delete_with_text(self.blob.as_ref(), &name, async {
            self.store.delete(session, path)
        })
        .await
    }
}
