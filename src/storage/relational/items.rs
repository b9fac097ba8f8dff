// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::{from_millis, to_millis, to_sql_count, Unit};
use crate::error::{Error, Result};
use crate::models::DiagramItem;
use crate::storage::blob::BlobStore;
use crate::storage::ownership::{verify_if_present, Owner};
use crate::storage::repository::text;
use crate::storage::repository::{ItemQuery, ItemRepository};
use crate::storage::session::Session;

const ITEM_COLUMNS: &str = "uid, id, title, text, diagram, thumbnail, is_public, is_bookmark, \
                            save_to_storage, created_at, updated_at";

/// Rebuild an item from a row carrying the item columns.
pub(super) fn item_from_row(row: &SqliteRow) -> Result<DiagramItem> {
    let text: Option<String> = row.try_get("text")?;
    let diagram: String = row.try_get("diagram")?;
    DiagramItem::builder()
        .with_id(row.try_get::<String, _>("id")?)
        .with_title(row.try_get::<String, _>("title")?)
        .with_encrypted_text(text.unwrap_or_default())
        .with_diagram_name(&diagram)
        .with_thumbnail(row.try_get("thumbnail")?)
        .with_is_public(row.try_get("is_public")?)
        .with_is_bookmark(row.try_get("is_bookmark")?)
        .with_save_to_storage(row.try_get("save_to_storage")?)
        .with_created_at(from_millis(row.try_get("created_at")?)?)
        .with_updated_at(from_millis(row.try_get("updated_at")?)?)
        .build()
}

/// Text column value: `NULL` when the blob store holds it.
pub(super) fn text_column(item: &DiagramItem) -> Option<&str> {
    (!item.save_to_storage()).then(|| item.encrypted_text())
}

struct ItemRow {
    owner: String,
    item: DiagramItem,
}

/// Items in `items`, public copies in `public_items`.
pub struct RelationalItemRepository {
    pool: SqlitePool,
    blob: Option<BlobStore>,
}

impl RelationalItemRepository {
    pub fn new(pool: SqlitePool, blob: Option<BlobStore>) -> Self {
        Self { pool, blob }
    }
}

async fn fetch_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
    is_public: bool,
) -> Result<Option<ItemRow>> {
    let row = if is_public {
        sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM public_items WHERE id = ?"))
            .bind(item_id)
            .fetch_optional(conn)
            .await?
    } else {
        sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE uid = ? AND id = ?"
        ))
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(conn)
        .await?
    };

    row.map(|row| {
        Ok(ItemRow {
            owner: row.try_get("uid")?,
            item: item_from_row(&row)?,
        })
    })
    .transpose()
}

async fn upsert_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item: &DiagramItem,
    is_public: bool,
) -> Result<()> {
    let conflict = if is_public {
        "ON CONFLICT(id)"
    } else {
        "ON CONFLICT(uid, id)"
    };
    let table = if is_public { "public_items" } else { "items" };
    let sql = format!(
        "INSERT INTO {table} ({ITEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         {conflict} DO UPDATE SET \
         title = excluded.title, text = excluded.text, diagram = excluded.diagram, \
         thumbnail = excluded.thumbnail, is_public = excluded.is_public, \
         is_bookmark = excluded.is_bookmark, save_to_storage = excluded.save_to_storage, \
         updated_at = excluded.updated_at"
    );

    sqlx::query(&sql)
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
        .execute(conn)
        .await?;
    Ok(())
}

async fn delete_item(
    conn: &mut SqliteConnection,
    user_id: &str,
    item_id: &str,
    is_public: bool,
) -> Result<()> {
    if is_public {
        sqlx::query("DELETE FROM public_items WHERE id = ?")
            .bind(item_id)
            .execute(conn)
            .await?;
    } else {
        sqlx::query("DELETE FROM items WHERE uid = ? AND id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(conn)
            .await?;
    }
    Ok(())
}

fn owned(row: Option<&ItemRow>) -> Option<Owner<'_>> {
    row.map(|row| Owner {
        user_id: &row.owner,
        resource: "public item",
    })
}

#[async_trait]
impl ItemRepository for RelationalItemRepository {
    async fn find_by_id(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let mut unit = Unit::read(session, &self.pool).await?;
        let row = fetch_item(unit.conn(), user_id, item_id, is_public)
            .await?
            .ok_or_else(|| Error::not_found(format!("item {item_id}")))?;
        unit.commit().await?;

        let mut item = row.item;
        let name = text::item_blob(&row.owner, item_id, is_public)?;
        text::load_text(self.blob.as_ref(), &name, &mut item).await?;
        Ok(item)
    }

    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        query: ItemQuery,
    ) -> Result<Vec<DiagramItem>> {
        let table = if query.is_public { "public_items" } else { "items" };
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM {table} \
             WHERE uid = ? AND (? = 0 OR is_bookmark = 1) \
             ORDER BY updated_at DESC LIMIT ? OFFSET ?"
        );

        let mut unit = Unit::read(session, &self.pool).await?;
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(query.is_bookmark)
            .bind(to_sql_count(query.limit))
            .bind(to_sql_count(query.offset))
            .fetch_all(unit.conn())
            .await?;
        unit.commit().await?;

        let items = rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>>>()?;
        text::load_texts(self.blob.as_ref(), items, query.load_text, |item| {
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
        let mut unit = Unit::write(session, &self.pool).await?;
        let existing = fetch_item(unit.conn(), user_id, item.id(), is_public).await?;
        if is_public {
            verify_if_present(owned(existing.as_ref()).as_ref(), user_id)?;
        }

        let stored = text::stamp(
            item,
            existing.map(|row| row.item.created_at()),
            self.blob.as_ref(),
        );
        let name = text::item_blob(user_id, item.id(), is_public)?;
        text::write_with_text(
            self.blob.as_ref(),
            &name,
            &stored,
            upsert_item(unit.conn(), user_id, &stored, is_public),
        )
        .await?;
        unit.commit().await?;

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
        let mut unit = Unit::write(session, &self.pool).await?;
        if is_public {
            let existing = fetch_item(unit.conn(), user_id, item_id, true).await?;
            verify_if_present(owned(existing.as_ref()).as_ref(), user_id)?;
        }

        let name = text::item_blob(user_id, item_id, is_public)?;
        text::delete_with_text(
            self.blob.as_ref(),
            &name,
            delete_item(unit.conn(), user_id, item_id, is_public),
        )
        .await?;
        unit.commit().await
    }
}
