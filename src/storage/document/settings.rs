// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::models::{Diagram, GistItem, Settings};
use crate::storage::repository::text;
use crate::storage::repository::{GistRepository, SettingsRepository};
use crate::storage::session::Session;

/// Settings as `users/{uid}/settings/{diagram}.json`.
pub struct DocumentSettingsRepository {
    store: Arc<DocumentStore>,
}

impl DocumentSettingsRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsRepository for DocumentSettingsRepository {
    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        diagram: Diagram,
    ) -> Result<Settings> {
        let path = self.store.paths().settings(user_id, diagram.as_str())?;
        match self.store.read(session, &path)? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
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
        let path = self.store.paths().settings(user_id, diagram.as_str())?;
        self.store
            .write(session, path, serde_json::to_value(settings)?)?;
        Ok(settings.clone())
    }
}

/// Gists as `users/{uid}/gists/{id}.json`.
pub struct DocumentGistRepository {
    store: Arc<DocumentStore>,
}

impl DocumentGistRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    fn load(&self, session: &Session, user_id: &str, gist_id: &str) -> Result<Option<GistItem>> {
        let path = self.store.paths().gist(user_id, gist_id)?;
        self.store
            .read(session, &path)?
            .map(serde_json::from_value::<GistItem>)
            .transpose()
            .map_err(Error::from)
    }
}

#[async_trait]
impl GistRepository for DocumentGistRepository {
    async fn find_by_id(
        &self,
        session: &mut Session,
        user_id: &str,
        gist_id: &str,
    ) -> Result<GistItem> {
        self.load(session, user_id, gist_id)?
            .ok_or_else(|| Error::not_found(format!("gist {gist_id}")))
    }

    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GistItem>> {
        let dir = self.store.paths().gists_dir(user_id)?;
        let gists = self
            .store
            .list(session, &dir)?
            .into_iter()
            .map(serde_json::from_value::<GistItem>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(text::page(gists, offset, limit, |g| g.updated_at))
    }

    async fn save(
        &self,
        session: &mut Session,
        user_id: &str,
        gist: &GistItem,
    ) -> Result<GistItem> {
        let mut stored = gist.clone();
        if let Some(existing) = self.load(session, user_id, &gist.id)? {
            stored.created_at = existing.created_at;
        }
        stored.updated_at = Utc::now().max(stored.created_at);

        let path = self.store.paths().gist(user_id, &gist.id)?;
        self.store
            .write(session, path, serde_json::to_value(&stored)?)?;
        Ok(stored)
    }

    async fn delete(&self, session: &mut Session, user_id: &str, gist_id: &str) -> Result<()> {
        let path = self.store.paths().gist(user_id, gist_id)?;
        self.store.delete(session, path)
    }
}
