// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use async_trait::async_trait;

use super::store::{user_key, EmbeddedStore, Table, ITEMS, PUBLIC_ITEMS};
use crate::error::{Error, Result};
use crate::models::DiagramItem;
use crate::storage::blob::BlobStore;
use crate::storage::ownership::verify_if_present;
use crate::storage::paths::safe_segment;
use crate::storage::repository::records::{item_document, parse_item_document, StoredItem};
use crate::storage::repository::text;
use crate::storage::repository::{ItemQuery, ItemRepository};
use crate::storage::session::Session;

/// Items in the `items` table, public copies in `public_items`.
pub struct EmbeddedItemRepository {
    store: Arc<EmbeddedStore>,
    blob: Option<BlobStore>,
}

impl EmbeddedItemRepository {
    pub fn new(store: Arc<EmbeddedStore>, blob: Option<BlobStore>) -> Self {
        Self { store, blob }
    }

    fn location(user_id: &str, item_id: &str, is_public: bool) -> Result<(Table, String)> {
        if is_public {
            Ok((PUBLIC_ITEMS, safe_segment(item_id)?.to_string()))
        } else {
            Ok((ITEMS, user_key(user_id, item_id)?))
        }
    }

    fn load(
        &self,
        session: &Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<Option<StoredItem>> {
        let (table, key) = Self::location(user_id, item_id, is_public)?;
        self.store
            .get(session, table, &key)?
            .map(|record| parse_item_document(&record))
            .transpose()
    }
}

#[async_trait]
impl ItemRepository for EmbeddedItemRepository {
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
        let records = if query.is_public {
            self.store.scan_all(session, PUBLIC_ITEMS)?
        } else {
            self.store.scan_user(session, ITEMS, user_id)?
        };

        let mut items = Vec::with_capacity(records.len());
        for record in &records {
            let stored = parse_item_document(record)?;
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
        let (table, key) = Self::location(user_id, item.id(), is_public)?;
        let name = text::item_blob(user_id, item.id(), is_public)?;
        let record = item_document(user_id, &stored);

        text::write_with_text(
            self.blob.as_ref(),
            &name,
            &stored,
            self.store.put(session, table, &key, &record),
        )
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

        let (table, key) = Self::location(user_id, item_id, is_public)?;
        let name = text::item_blob(user_id, item_id, is_public)?;
        text::delete_with_text(
            self.blob.as_ref(),
            &name,
            self.store.remove(session, table, &key),
        )
        .await
    }
}
