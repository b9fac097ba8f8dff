// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::items::{item_from_row, text_column};
use super::{to_millis, Unit};
use crate::error::{Error, Result};
use crate::models::{DiagramItem, Share};
use crate::storage::blob::BlobStore;
use crate::storage::ownership::{OwnershipEnforcer, Owner};
use crate::storage::paths;
use crate::storage::repository::text;
use crate::storage::repository::{ShareRepository, SharedItem};
use crate::storage::session::Session;

/// Share policies with their item snapshot in `share_items`.
pub struct RelationalShareRepository {
    pool: SqlitePool,
    blob: Option<BlobStore>,
}

impl RelationalShareRepository {
    pub fn new(pool: SqlitePool, blob: Option<BlobStore>) -> Self {
        Self { pool, blob }
    }
}

fn share_from_row(row: &SqliteRow) -> Result<Share> {
    let allow_ip_list: String = row.try_get("allow_ip_list")?;
    let allow_email_list: String = row.try_get("allow_email_list")?;
    Ok(Share {
        token: row.try_get("token")?,
        password: row.try_get("password")?,
        allow_ip_list: serde_json::from_str(&allow_ip_list)?,
        allow_email_list: serde_json::from_str(&allow_email_list)?,
        expire_time: row.try_get("expire_time")?,
    })
}

async fn fetch_share(conn: &mut SqliteConnection, share_id: &str) -> Result<Option<SharedItem>> {
    let row = sqlx::query(
        "SELECT uid, item_id AS id, title, text, diagram, thumbnail, is_public, is_bookmark, \
         save_to_storage, created_at, updated_at, token, password, allow_ip_list, \
         allow_email_list, expire_time \
         FROM share_items WHERE hashkey = ?",
    )
    .bind(share_id)
    .fetch_optional(conn)
    .await?;

    row.map(|row| {
        Ok(SharedItem {
            owner: row.try_get("uid")?,
            item: item_from_row(&row)?,
            share: share_from_row(&row)?,
        })
    })
    .transpose()
}

/// Owner and snapshot item id of an existing share.
async fn fetch_owner(
    conn: &mut SqliteConnection,
    share_id: &str,
) -> Result<Option<(String, String)>> {
    let row = sqlx::query("SELECT uid, item_id FROM share_items WHERE hashkey = ?")
        .bind(share_id)
        .fetch_optional(conn)
        .await?;
    row.map(|row| Ok((row.try_get("uid")?, row.try_get("item_id")?)))
        .transpose()
}

async fn replace_share(
    conn: &mut SqliteConnection,
    user_id: &str,
    share_id: &str,
    item: &DiagramItem,
    share: &Share,
) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO share_items \
         (hashkey, uid, item_id, title, text, diagram, thumbnail, is_public, is_bookmark, \
          save_to_storage, created_at, updated_at, token, password, allow_ip_list, \
          allow_email_list, expire_time) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(share_id)
    .bind(user_id)
    .bind(item.id())
    .bind(item.title())
    .bind(text_column(item))
    .bind(item.diagram().as_str())
    .bind(item.thumbnail())
    .bind(item.is_public())
    .bind(item.is_bookmark())
    .bind(item.save_to_storage())
    .bind(to_millis(item.created_at()))
    .bind(to_millis(item.updated_at()))
    .bind(&share.token)
    .bind(&share.password)
    .bind(serde_json::to_string(&share.allow_ip_list)?)
    .bind(serde_json::to_string(&share.allow_email_list)?)
    .bind(share.expire_time)
    .execute(conn)
    .await?;
    Ok(())
}

async fn delete_share(conn: &mut SqliteConnection, share_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM share_items WHERE hashkey = ?")
        .bind(share_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn share_owner(owner: &str) -> Owner<'_> {
    Owner {
        user_id: owner,
        resource: "share",
    }
}

#[async_trait]
impl ShareRepository for RelationalShareRepository {
    async fn find(&self, session: &mut Session, share_id: &str) -> Result<SharedItem> {
        let mut unit = Unit::read(session, &self.pool).await?;
        let mut shared = fetch_share(unit.conn(), share_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("share {share_id}")))?;
        unit.commit().await?;

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
        let mut unit = Unit::write(session, &self.pool).await?;
        if let Some((owner, _)) = fetch_owner(unit.conn(), share_id).await? {
            share_owner(&owner).verify_ownership(user_id)?;
        }

        let snapshot = text::snapshot(item, self.blob.as_ref());
        let name = paths::share_item_blob(share_id, item.id())?;
        text::write_with_text(
            self.blob.as_ref(),
            &name,
            &snapshot,
            replace_share(unit.conn(), user_id, share_id, &snapshot, share),
        )
        .await?;
        unit.commit().await
    }

    async fn delete(&self, session: &mut Session, user_id: &str, share_id: &str) -> Result<()> {
        let mut unit = Unit::write(session, &self.pool).await?;
        let Some((owner, item_id)) = fetch_owner(unit.conn(), share_id).await? else {
            return Ok(());
        };
        share_owner(&owner).verify_ownership(user_id)?;

        let name = paths::share_item_blob(share_id, &item_id)?;
        text::delete_with_text(self.blob.as_ref(), &name, delete_share(unit.conn(), share_id))
            .await?;
        unit.commit().await
    }
}
