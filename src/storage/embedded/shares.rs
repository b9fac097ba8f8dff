// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use async_trait::async_trait;

use super::store::{EmbeddedStore, SHARE_ITEMS};
use crate::error::{Error, Result};
use crate::models::{DiagramItem, Share};
use crate::storage::blob::BlobStore;
use crate::storage::ownership::{verify_if_present, OwnershipEnforcer};
use crate::storage::paths::{self, safe_segment};
use crate::storage::repository::records::ShareDocument;
use crate::storage::repository::text;
use crate::storage::repository::{ShareRepository, SharedItem};
use crate::storage::session::Session;

/// Share records in the `share_items` table, keyed by share id.
pub struct EmbeddedShareRepository {
    store: Arc<EmbeddedStore>,
    blob: Option<BlobStore>,
}

impl EmbeddedShareRepository {
    pub fn new(store: Arc<EmbeddedStore>, blob: Option<BlobStore>) -> Self {
        Self { store, blob }
    }

    fn load(&self, session: &Session, share_id: &str) -> Result<Option<ShareDocument>> {
        self.store
            .get(session, SHARE_ITEMS, safe_segment(share_id)?)?
            .map(serde_json::from_value::<ShareDocument>)
            .transpose()
            .map_err(Error::from)
    }
}

#[async_trait]
impl ShareRepository for EmbeddedShareRepository {
    async fn find(&self, session: &mut Session, share_id: &str) -> Result<SharedItem> {
        let record = self
            .load(session, share_id)?
            .ok_or_else(|| Error::not_found(format!("share {share_id}")))?;
        let mut shared = record.into_shared()?;
        let name = paths::share_item_blob(share_id, shared.item.id())?;
        text::load_text(self.blob.as_ref(), &name, &mut shared.item).await?;
        Ok(shared)
    }

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        share_id: &str,
        item: &DiagramItem,
        share: &Share,
    ) -> Result<()> {
        let existing = self.load(session, share_id)?;
        verify_if_present(existing.as_ref(), user_id)?;

        let snapshot = text::snapshot(item, self.blob.as_ref());
        let name = paths::share_item_blob(share_id, item.id())?;
        let record = serde_json::to_value(ShareDocument::new(user_id, &snapshot, share))?;

        text::write_with_text(
            self.blob.as_ref(),
            &name,
            &snapshot,
            self.store.put(session, SHARE_ITEMS, share_id, &record),
        )
        .await
    }

    async fn delete(&self, session: &mut Session, user_id: &str, share_id: &str) -> Result<()> {
        let Some(existing) = self.load(session, share_id)? else {
            return Ok(());
        };
        existing.verify_ownership(user_id)?;

        let item_id = existing
            .item_id()
            .ok_or_else(|| Error::invalid("share snapshot has no item id"))?;
        let name = paths::share_item_blob(share_id, item_id)?;
        text::delete_with_text(
            self.blob.as_ref(),
            &name,
            self.store.remove(session, SHARE_ITEMS, share_id),
        )
        .await
    }
}
