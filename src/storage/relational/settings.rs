// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis, to_sql_count, Unit};
use crate::error::{Error, Result};
use crate::models::{Diagram, GistItem, Settings};
use crate::storage::repository::{GistRepository, SettingsRepository};
use crate::storage::session::Session;

/// Settings as JSON text keyed by `(uid, diagram)`.
pub struct RelationalSettingsRepository {
    pool: SqlitePool,
}

impl RelationalSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for RelationalSettingsRepository {
    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        diagram: Diagram,
    ) -> Result<Settings> {
        let mut unit = Unit::read(session, &self.pool).await?;
        let raw: Option<String> =
            sqlx::query_scalar("SELECT settings FROM settings WHERE uid = ? AND diagram = ?")
                .bind(user_id)
                .bind(diagram.as_str())
                .fetch_optional(unit.conn())
                .await?;
        unit.commit().await?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Err(Error::not_found(format!("settings {diagram}"))),
        }
    }

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        diagram: Diagram,
        settings: &Settings,
    ) -> Result<Settings> {
        let raw = serde_json::to_string(settings)?;
        let mut unit = Unit::write(session, &self.pool).await?;
        sqlx::query(
            "INSERT INTO settings (uid, diagram, settings, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(uid, diagram) DO UPDATE SET \
             settings = excluded.settings, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(diagram.as_str())
        .bind(raw)
        .bind(to_millis(Utc::now()))
        .execute(unit.conn())
        .await?;
        unit.commit().await?;
        Ok(settings.clone())
    }
}

const GIST_COLUMNS: &str =
    "id, url, title, thumbnail, diagram, is_bookmark, created_at, updated_at";

fn gist_from_row(row: &SqliteRow) -> Result<GistItem> {
    let diagram: String = row.try_get("diagram")?;
    Ok(GistItem {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        thumbnail: row.try_get("thumbnail")?,
        diagram: diagram.parse()?,
        is_bookmark: row.try_get("is_bookmark")?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

/// Gist bookmarks in `gist_items`.
pub struct RelationalGistRepository {
    pool: SqlitePool,
}

impl RelationalGistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GistRepository for RelationalGistRepository {
    async fn find_by_id(
        &self,
        session: &mut Session,
        user_id: &str,
        gist_id: &str,
    ) -> Result<GistItem> {
        let mut unit = Unit::read(session, &self.pool).await?;
        let row = sqlx::query(&format!(
            "SELECT {GIST_COLUMNS} FROM gist_items WHERE uid = ? AND id = ?"
        ))
        .bind(user_id)
        .bind(gist_id)
        .fetch_optional(unit.conn())
        .await?;
        unit.commit().await?;

        match row {
            Some(row) => gist_from_row(&row),
            None => Err(Error::not_found(format!("gist {gist_id}"))),
        }
    }

    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GistItem>> {
        let mut unit = Unit::read(session, &self.pool).await?;
        let rows = sqlx::query(&format!(
            "SELECT {GIST_COLUMNS} FROM gist_items WHERE uid = ? \
             ORDER BY updated_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(to_sql_count(limit))
        .bind(to_sql_count(offset))
        .fetch_all(unit.conn())
        .await?;
        unit.commit().await?;

        rows.iter().map(gist_from_row).collect()
    }

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        gist: &GistItem,
    ) -> Result<GistItem> {
        let mut unit = Unit::write(session, &self.pool).await?;
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT created_at FROM gist_items WHERE uid = ? AND id = ?")
                .bind(user_id)
                .bind(&gist.id)
                .fetch_optional(unit.conn())
                .await?;

        let mut stored = gist.clone();
        if let Some(created_at) = existing {
            stored.created_at = from_millis(created_at)?;
        }
        stored.updated_at = Utc::now().max(stored.created_at);

        sqlx::query(&format!(
            "INSERT INTO gist_items (uid, {GIST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(uid, id) DO UPDATE SET \
             url = excluded.url, title = excluded.title, thumbnail = excluded.thumbnail, \
             diagram = excluded.diagram, is_bookmark = excluded.is_bookmark, \
             updated_at = excluded.updated_at"
        ))
        .bind(user_id)
        .bind(&stored.id)
        .bind(&stored.url)
        .bind(&stored.title)
        .bind(stored.thumbnail.as_deref())
        .bind(stored.diagram.as_str())
        .bind(stored.is_bookmark)
        .bind(to_millis(stored.created_at))
        .bind(to_millis(stored.updated_at))
        .execute(unit.conn())
        .await?;
        unit.commit().await?;
        Ok(stored)
    }

    async fn delete(&self, session: &mut Session, user_id: &str, gist_id: &str) -> Result<()> {
        let mut unit = Unit::write(session, &self.pool).await?;
        sqlx::query("DELETE FROM gist_items WHERE uid = ? AND id = ?")
            .bind(user_id)
            .bind(gist_id)
            .execute(unit.conn())
            .await?;
        unit.commit().await
    }
}
