// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Resolves profile data for a verified user id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Primary email of the user, if one is known.
    async fn email(&self, user_id: &str) -> Result<Option<String>>;
}

/// Fixed user id to email table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    emails: HashMap<String, String>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, user_id: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(user_id.into(), email.into());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn email(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.emails.get(user_id).cloned())
    }
}
