// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::store::{user_key, EmbeddedStore, GISTS, SETTINGS};
use crate::error::{Error, Result};
use crate::models::{Diagram, GistItem, Settings};
use crate::storage::repository::text;
use crate::storage::repository::{GistRepository, SettingsRepository};
use crate::storage::session::Session;

/// Settings keyed by `{uid}/{diagram}`.
pub struct EmbeddedSettingsRepository {
    store: Arc<EmbeddedStore>,
}

impl EmbeddedSettingsRepository {
    pub fn new(store: Arc<EmbeddedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsRepository for EmbeddedSettingsRepository {
    async fn find(
        &self,
        session: &mut Session,
        user_id: &str,
        diagram: Diagram,
    ) -> Result<Settings> {
        let key = user_key(user_id, diagram.as_str())?;
        match self.store.get(session, SETTINGS, &key)? {
            Some(record) => Ok(serde_json::from_value(record)?),
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
        let key = user_key(user_id, diagram.as_str())?;
        self.store
            .put(session, SETTINGS, &key, &serde_json::to_value(settings)?)
            .await?;
        Ok(settings.clone())
    }
}

/// Gists keyed by `{uid}/{gist_id}`.
pub struct EmbeddedGistRepository {
    store: Arc<EmbeddedStore>,
}

impl EmbeddedGistRepository {
    pub fn new(store: Arc<EmbeddedStore>) -> Self {
        Self { store }
    }

    fn load(&self, session: &Session, user_id: &str, gist_id: &str) -> Result<Option<GistItem>> {
        let key = user_key(user_id, gist_id)?;
        self.store
            .get(session, GISTS, &key)?
            .map(serde_json::from_value::<GistItem>)
            .transpose()
            .map_err(Error::from)
    }
}

#[async_trait]
impl GistRepository for EmbeddedGistRepository {
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
        let gists = self
            .store
            .scan_user(session, GISTS, user_id)?
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

        let key = user_key(user_id, &gist.id)?;
        self.store
            .put(session, GISTS, &key, &serde_json::to_value(&stored)?)
            .await?;
        Ok(stored)
    }

    async fn delete(&self, session: &mut Session, user_id: &str, gist_id: &str) -> Result<()> {
        let key = user_key(user_id, gist_id)?;
        self.store.remove(session, GISTS, &key).await
    }
}
