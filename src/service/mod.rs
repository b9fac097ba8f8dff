// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Services
//!
//! The authorization boundary. Transport layers build a
//! [`RequestContext`](crate::auth::RequestContext) per call and invoke these
//! services; the services check the caller's identity and ownership and
//! drive the repositories of the configured backend.

pub mod diagram;
pub mod gist;
pub mod settings;

use std::sync::Arc;

pub use diagram::{DiagramService, ShareRequest};
pub use gist::GistService;
pub use settings::SettingsService;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::crypto::Codec;
use crate::error::Result;
use crate::share::ShareTokenService;
use crate::storage::Repositories;

/// All services over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub diagrams: Arc<DiagramService>,
    pub gists: Arc<GistService>,
    pub settings: Arc<SettingsService>,
}

impl Services {
    pub fn new(
        repos: Repositories,
        codec: Arc<Codec>,
        tokens: Arc<ShareTokenService>,
        identity: Arc<dyn IdentityProvider>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            gists: Arc::new(GistService::new(repos.gists.clone())),
            settings: Arc::new(SettingsService::new(repos.settings.clone())),
            diagrams: Arc::new(DiagramService::new(
                repos,
                codec,
                tokens,
                identity,
                bcrypt_cost,
            )),
        }
    }

    /// Open storage and key material described by `config`.
    pub async fn open(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let repos = Repositories::open(&config.storage).await?;
        let codec = Arc::new(Codec::new(config.encryption_key.clone()));
        let tokens = Arc::new(ShareTokenService::from_keys(&config.share)?);
        tracing::info!(backend = ?config.storage.backend, "services ready");
        Ok(Self::new(repos, codec, tokens, identity, config.bcrypt_cost))
    }
}
