// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unit-of-work handles shared by repository calls.
//!
//! A [`Session`] is passed explicitly to every repository method. An
//! *ambient* session makes each call its own unit of work. A session opened
//! by a [`TransactionManager`] carries a backend-native transaction which
//! repositories of that backend use in place of their ambient client, so
//! every call made with it commits or rolls back together.
//!
//! ```rust,ignore
//! let mut session = manager.begin().await?;
//! let outcome = do_work(&mut session).await;
//! finish(manager, session, outcome).await
//! ```

use async_trait::async_trait;
use sqlx::Sqlite;

use super::document::DocumentTransaction;
use super::embedded::EmbeddedTransaction;
use crate::error::{Error, Result};

/// Backend-native transaction held by a session.
pub(crate) enum ActiveTransaction {
    Document(DocumentTransaction),
    Relational(sqlx::Transaction<'static, Sqlite>),
    Embedded(EmbeddedTransaction),
}

impl ActiveTransaction {
    fn backend(&self) -> &'static str {
        match self {
            ActiveTransaction::Document(_) => "document",
            ActiveTransaction::Relational(_) => "relational",
            ActiveTransaction::Embedded(_) => "embedded",
        }
    }
}

/// Explicit transaction handle threaded through repository calls.
#[derive(Default)]
pub struct Session {
    active: Option<ActiveTransaction>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.active.as_ref().map(ActiveTransaction::backend))
            .finish()
    }
}

impl Session {
    /// A session without a transaction.
    pub fn ambient() -> Self {
        Self::default()
    }

    pub(crate) fn with(active: ActiveTransaction) -> Self {
        Self {
            active: Some(active),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn into_active(self) -> Option<ActiveTransaction> {
        self.active
    }

    pub(crate) fn document(&mut self) -> Option<&mut DocumentTransaction> {
        match self.active.as_mut() {
            Some(ActiveTransaction::Document(tx)) => Some(tx),
            _ => None,
        }
    }

    pub(crate) fn document_ref(&self) -> Option<&DocumentTransaction> {
        match self.active.as_ref() {
            Some(ActiveTransaction::Document(tx)) => Some(tx),
            _ => None,
        }
    }

    pub(crate) fn relational(&mut self) -> Option<&mut sqlx::Transaction<'static, Sqlite>> {
        match self.active.as_mut() {
            Some(ActiveTransaction::Relational(tx)) => Some(tx),
            _ => None,
        }
    }

    pub(crate) fn embedded(&self) -> Option<&EmbeddedTransaction> {
        match self.active.as_ref() {
            Some(ActiveTransaction::Embedded(tx)) => Some(tx),
            _ => None,
        }
    }
}

/// Opens, commits and rolls back sessions for one backend.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Session>;

    async fn commit(&self, session: Session) -> Result<()>;

    async fn rollback(&self, session: Session) -> Result<()>;
}

/// Commit on success, roll back on failure.
///
/// The original error is always returned; a failed rollback is only logged.
pub async fn finish<T>(
    manager: &dyn TransactionManager,
    session: Session,
    outcome: Result<T>,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            manager.commit(session).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = manager.rollback(session).await {
                tracing::warn!(error = %rollback_err, cause = %err, "rollback failed");
            } else {
                tracing::debug!(cause = %err, "transaction rolled back");
            }
            Err(err)
        }
    }
}

pub(crate) fn foreign_session(expected: &'static str, active: &ActiveTransaction) -> Error {
    Error::internal(format!(
        "{} session passed to the {expected} transaction manager",
        active.backend()
    ))
}
