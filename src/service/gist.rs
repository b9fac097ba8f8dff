// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::RequestContext;
use crate::error::Result;
use crate::models::GistItem;
use crate::storage::{GistRepository, Session};

/// The caller's gist bookmarks.
pub struct GistService {
    gists: Arc<dyn GistRepository>,
}

impl GistService {
    pub fn new(gists: Arc<dyn GistRepository>) -> Self {
        Self { gists }
    }

    pub async fn find_by_id(&self, ctx: &RequestContext, gist_id: &str) -> Result<GistItem> {
        let user = ctx.require_user()?;
        self.gists
            .find_by_id(&mut Session::ambient(), &user.user_id, gist_id)
            .await
    }

    pub async fn find(
        &self,
        ctx: &RequestContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<GistItem>> {
        let user = ctx.require_user()?;
        self.gists
            .find(&mut Session::ambient(), &user.user_id, offset, limit)
            .await
    }

    pub async fn save(&self, ctx: &RequestContext, gist: &GistItem) -> Result<GistItem> {
        let user = ctx.require_user()?;
        let saved = self
            .gists
            .save(&mut Session::ambient(), &user.user_id, gist)
            .await?;
        tracing::debug!(user_id = %user.user_id, gist_id = %saved.id, "gist saved");
        Ok(saved)
    }

    pub async fn delete(&self, ctx: &RequestContext, gist_id: &str) -> Result<()> {
        let user = ctx.require_user()?;
        self.gists
            .delete(&mut Session::ambient(), &user.user_id, gist_id)
            .await
    }
}
