// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relational Backend
//!
//! SQLite through a `sqlx` pool. The schema lives in `migrations/` and is
//! applied on open:
//!
//! | Table          | Key               | Contents                              |
//! |----------------|-------------------|---------------------------------------|
//! | `items`        | `(uid, id)`       | private items                         |
//! | `public_items` | `id`              | public copies with owner `uid`        |
//! | `share_items`  | `hashkey`         | share policy + item snapshot columns  |
//! | `settings`     | `(uid, diagram)`  | settings as JSON text                 |
//! | `gist_items`   | `(uid, id)`       | gist bookmarks                        |
//!
//! Item text is `NULL` when it lives in the blob store. Timestamps are stored
//! as epoch milliseconds.

mod items;
mod settings;
mod shares;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

pub use items::RelationalItemRepository;
pub use settings::{RelationalGistRepository, RelationalSettingsRepository};
pub use shares::RelationalShareRepository;

use super::blob::BlobStore;
use super::repository::Repositories;
use super::session::{foreign_session, ActiveTransaction, Session, TransactionManager};
use crate::error::{Error, Result};

const MAX_CONNECTIONS: u32 = 5;

/// Open (creating if needed) the SQLite database and run migrations.
///
/// `database_url` is either a `sqlite:` URL or a plain file path.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = if database_url.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(database_url)?
    } else {
        let path = Path::new(database_url);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        SqliteConnectOptions::new().filename(path)
    }
    .create_if_missing(true)
    .journal_mode(SqliteJournalMode::Wal)
    .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!(database_url, "relational schema up to date");
    Ok(pool)
}

/// Open the relational backend.
pub async fn open(database_url: &str, blob: Option<BlobStore>) -> Result<Repositories> {
    let pool = connect(database_url).await?;
    Ok(Repositories {
        items: Arc::new(RelationalItemRepository::new(pool.clone(), blob.clone())),
        shares: Arc::new(RelationalShareRepository::new(pool.clone(), blob)),
        settings: Arc::new(RelationalSettingsRepository::new(pool.clone())),
        gists: Arc::new(RelationalGistRepository::new(pool.clone())),
        transactions: Arc::new(RelationalTransactions::new(pool)),
    })
}

/// Sessions backed by one SQLite transaction.
pub struct RelationalTransactions {
    pool: SqlitePool,
}

impl RelationalTransactions {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for RelationalTransactions {
    async fn begin(&self) -> Result<Session> {
        let tx = self.pool.begin().await?;
        Ok(Session::with(ActiveTransaction::Relational(tx)))
    }

    async fn commit(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Relational(tx)) => Ok(tx.commit().await?),
            Some(other) => Err(foreign_session("relational", &other)),
        }
    }

    async fn rollback(&self, session: Session) -> Result<()> {
        match session.into_active() {
            None => Ok(()),
            Some(ActiveTransaction::Relational(tx)) => Ok(tx.rollback().await?),
            Some(other) => Err(foreign_session("relational", &other)),
        }
    }
}

// ========== Connection Handling ==========

/// Connection a single repository call runs on.
///
/// Inside a relational session this is the session's transaction. Outside
/// one, reads take a pooled connection and writes open their own
/// transaction, committed by [`Unit::commit`].
pub(crate) enum Unit<'s> {
    Shared(&'s mut Transaction<'static, Sqlite>),
    Owned(Transaction<'static, Sqlite>),
    Pooled(PoolConnection<Sqlite>),
}

impl<'s> Unit<'s> {
    pub(crate) async fn read(session: &'s mut Session, pool: &SqlitePool) -> Result<Self> {
        match session.relational() {
            Some(tx) => Ok(Unit::Shared(tx)),
            None => Ok(Unit::Pooled(pool.acquire().await?)),
        }
    }

    pub(crate) async fn write(session: &'s mut Session, pool: &SqlitePool) -> Result<Self> {
        match session.relational() {
            Some(tx) => Ok(Unit::Shared(tx)),
            None => Ok(Unit::Owned(pool.begin().await?)),
        }
    }

    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            Unit::Shared(tx) => &mut ***tx,
            Unit::Owned(tx) => &mut **tx,
            Unit::Pooled(conn) => &mut **conn,
        }
    }

    /// Commit a transaction this unit opened itself. Session transactions are
    /// left to the session's manager.
    pub(crate) async fn commit(self) -> Result<()> {
        if let Unit::Owned(tx) = self {
            tx.commit().await?;
        }
        Ok(())
    }
}

// ========== Column Conversions ==========

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::internal(format!("stored timestamp {millis} is out of range")))
}

pub(crate) fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::conformance;

    async fn repositories(dir: &tempfile::TempDir, blob: Option<BlobStore>) -> Repositories {
        let path = dir.path().join("db").join(crate::config::RELATIONAL_DB_FILE);
        open(path.to_str().unwrap(), blob).await.unwrap()
    }

    #[tokio::test]
    async fn item_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::items(&repositories(&dir, None).await).await;
    }

    #[tokio::test]
    async fn item_contract_with_blob_store() {
        let dir = tempfile::tempdir().unwrap();
        let blob = BlobStore::memory();
        conformance::items_with_blob(&repositories(&dir, Some(blob.clone())).await, &blob).await;
    }

    #[tokio::test]
    async fn share_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::shares(&repositories(&dir, None).await).await;
        let dir = tempfile::tempdir().unwrap();
        conformance::shares(&repositories(&dir, Some(BlobStore::memory())).await).await;
    }

    #[tokio::test]
    async fn settings_and_gist_contract() {
        let dir = tempfile::tempdir().unwrap();
        let repos = repositories(&dir, None).await;
        conformance::settings(&repos).await;
        conformance::gists(&repos).await;
    }

    #[tokio::test]
    async fn transaction_contract() {
        let dir = tempfile::tempdir().unwrap();
        conformance::transactions(&repositories(&dir, None).await).await;
    }

    #[tokio::test]
    async fn text_column_is_null_when_blob_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::config::RELATIONAL_DB_FILE);
        let url = path.to_str().unwrap();
        let repos = open(url, Some(BlobStore::memory())).await.unwrap();
        repos
            .items
            .save(
                &mut Session::ambient(),
                "user-1",
                &conformance::sample_item("n1"),
                false,
            )
            .await
            .unwrap();

        let pool = connect(url).await.unwrap();
        let text: Option<String> = sqlx::query_scalar("SELECT text FROM items WHERE id = ?")
            .bind("n1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn millis_round_trip() {
        let now = Utc::now();
        assert_eq!(
            from_millis(to_millis(now)).unwrap().timestamp_millis(),
            now.timestamp_millis()
        );
    }
}
