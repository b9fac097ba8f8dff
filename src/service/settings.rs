// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::RequestContext;
use crate::error::Result;
use crate::models::{Diagram, Settings};
use crate::storage::{Session, SettingsRepository};

/// Per-diagram display settings of the caller.
pub struct SettingsService {
    settings: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsRepository>) -> Self {
        Self { settings }
    }

    /// Stored settings, or the defaults when none were saved yet.
    pub async fn find(&self, ctx: &RequestContext, diagram: Diagram) -> Result<Settings> {
        let user = ctx.require_user()?;
        match self
            .settings
            .find(&mut Session::ambient(), &user.user_id, diagram)
            .await
        {
            Err(err) if err.is_not_found() => Ok(Settings::default()),
            other => other,
        }
    }

    pub async fn save(
        &self,
        ctx: &RequestContext,
        diagram: Diagram,
        settings: &Settings,
    ) -> Result<Settings> {
        let user = ctx.require_user()?;
        self.settings
            .save(&mut Session::ambient(), &user.user_id, diagram, settings)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::service::tests::services;

    #[tokio::test]
    async fn unsaved_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = services(&dir).settings;
        let ctx = RequestContext::authenticated("user-1", "");

        assert_eq!(
            service.find(&ctx, Diagram::MindMap).await.unwrap(),
            Settings::default()
        );

        let mut custom = Settings::default();
        custom.width = 2048;
        service.save(&ctx, Diagram::MindMap, &custom).await.unwrap();
        assert_eq!(service.find(&ctx, Diagram::MindMap).await.unwrap().width, 2048);
        assert_eq!(
            service.find(&ctx, Diagram::Kanban).await.unwrap(),
            Settings::default()
        );
    }

    #[tokio::test]
    async fn settings_need_a_caller() {
        let dir = tempfile::tempdir().unwrap();
        let service = services(&dir).settings;
        assert!(matches!(
            service
                .find(&RequestContext::anonymous(""), Diagram::MindMap)
                .await,
            Err(Error::NoAuthorization)
        ));
    }
}
