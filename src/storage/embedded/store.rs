// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! redb tables of JSON records.
//!
//! Keys are `&str`; per-user records use `{uid}/{id}` so a user's records
//! form one contiguous key range. Reads made through an embedded session go
//! through its write transaction and see its uncommitted writes.
//!
//! redb admits one write transaction at a time and `begin_write` blocks the
//! calling thread until the current one finishes. Every writer therefore
//! first takes the store's single writer permit asynchronously, so a task
//! waiting for the writer yields instead of parking a runtime worker.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, Result};
use crate::storage::paths::safe_segment;
use crate::storage::session::Session;

pub(crate) type Table = TableDefinition<'static, &'static str, &'static [u8]>;

/// `{uid}/{item_id}` -> item record.
pub(crate) const ITEMS: Table = TableDefinition::new("items");
/// `{item_id}` -> public item record with owner.
pub(crate) const PUBLIC_ITEMS: Table = TableDefinition::new("public_items");
/// `{share_id}` -> share record.
pub(crate) const SHARE_ITEMS: Table = TableDefinition::new("share_items");
/// `{uid}/{diagram}` -> settings.
pub(crate) const SETTINGS: Table = TableDefinition::new("settings");
/// `{uid}/{gist_id}` -> gist.
pub(crate) const GISTS: Table = TableDefinition::new("gist_items");

const ALL_TABLES: [Table; 5] = [ITEMS, PUBLIC_ITEMS, SHARE_ITEMS, SETTINGS, GISTS];

/// Key of a per-user record.
pub(crate) fn user_key(user_id: &str, id: &str) -> Result<String> {
    Ok(format!("{}/{}", safe_segment(user_id)?, safe_segment(id)?))
}

/// Bounds `[start, end)` covering every key of one user.
fn user_range(user_id: &str) -> Result<(String, String)> {
    let user_id = safe_segment(user_id)?;
    // '0' is the byte after '/'.
    Ok((format!("{user_id}/"), format!("{user_id}0")))
}

fn get_in<T>(table: &T, key: &str) -> Result<Option<Value>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn scan_in<T>(table: &T, range: Option<&(String, String)>) -> Result<Vec<Value>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let entries = match range {
        Some((start, end)) => table.range(start.as_str()..end.as_str())?,
        None => table.iter()?,
    };
    let mut values = Vec::new();
    for entry in entries {
        let (_, value) = entry?;
        values.push(serde_json::from_slice(value.value())?);
    }
    Ok(values)
}

/// A redb write transaction together with the writer permit it holds.
pub struct EmbeddedTransaction {
    // Declared first so an uncommitted transaction aborts before the permit
    // is released.
    txn: WriteTransaction,
    _permit: OwnedSemaphorePermit,
}

impl EmbeddedTransaction {
    pub(crate) fn txn(&self) -> &WriteTransaction {
        &self.txn
    }

    pub(crate) fn commit(self) -> Result<()> {
        Ok(self.txn.commit()?)
    }

    pub(crate) fn abort(self) -> Result<()> {
        Ok(self.txn.abort()?)
    }
}

/// One redb database file.
pub struct EmbeddedStore {
    db: Database,
    writer: Arc<Semaphore>,
}

impl std::fmt::Debug for EmbeddedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedStore").finish_non_exhaustive()
    }
}

impl EmbeddedStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        for table in ALL_TABLES {
            let _ = write_txn.open_table(table)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            writer: Arc::new(Semaphore::new(1)),
        })
    }

    /// Wait for the writer permit, then open the write transaction.
    pub(crate) async fn begin(&self) -> Result<EmbeddedTransaction> {
        let permit = self
            .writer
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::internal("embedded writer closed"))?;
        Ok(EmbeddedTransaction {
            txn: self.db.begin_write()?,
            _permit: permit,
        })
    }

    // ========== Reads ==========

    pub fn get(&self, session: &Session, table: Table, key: &str) -> Result<Option<Value>> {
        match session.embedded() {
            Some(tx) => get_in(&tx.txn().open_table(table)?, key),
            None => {
                let read_txn = self.db.begin_read()?;
                get_in(&read_txn.open_table(table)?, key)
            }
        }
    }

    /// Every record of `user_id` in a per-user table.
    pub fn scan_user(&self, session: &Session, table: Table, user_id: &str) -> Result<Vec<Value>> {
        self.scan(session, table, Some(&user_range(user_id)?))
    }

    /// Every record in the table.
    pub fn scan_all(&self, session: &Session, table: Table) -> Result<Vec<Value>> {
        self.scan(session, table, None)
    }

    fn scan(
        &self,
        session: &Session,
        table: Table,
        range: Option<&(String, String)>,
    ) -> Result<Vec<Value>> {
        match session.embedded() {
            Some(tx) => scan_in(&tx.txn().open_table(table)?, range),
            None => {
                let read_txn = self.db.begin_read()?;
                scan_in(&read_txn.open_table(table)?, range)
            }
        }
    }

    // ========== Writes ==========

    pub async fn put(
        &self,
        session: &mut Session,
        table: Table,
        key: &str,
        value: &Value,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write(session, |tx| {
            let mut table = tx.open_table(table)?;
            table.insert(key, bytes.as_slice())?;
            Ok(())
        })
        .await
    }

    /// Removing a missing key is not an error.
    pub async fn remove(&self, session: &mut Session, table: Table, key: &str) -> Result<()> {
        self.write(session, |tx| {
            let mut table = tx.open_table(table)?;
            table.remove(key)?;
            Ok(())
        })
        .await
    }

    /// Run `op` in the session's transaction, or in its own committed one.
    async fn write<F>(&self, session: &mut Session, op: F) -> Result<()>
    where
        F: FnOnce(&WriteTransaction) -> Result<()>,
    {
        if let Some(tx) = session.embedded() {
            return op(tx.txn());
        }
        let tx = self.begin().await?;
        match op(tx.txn()) {
            Ok(()) => tx.commit(),
            Err(err) => {
                if let Err(abort_err) = tx.abort() {
                    tracing::warn!(error = %abort_err, "embedded write abort failed");
                }
                Err(err)
            }
        }
    }
}
