// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Diagram items and their share links.
//!
//! Every method except [`DiagramService::find_share_item`] requires an
//! authenticated caller and fails with [`Error::NoAuthorization`] before
//! touching storage otherwise. Multi-record writes run inside one session of
//! the configured backend.
//!
//! Share ids are derived from the item id alone while item ids are chosen by
//! clients, so two users can hold items with the same id. The share under
//! that id belongs to whoever created it first. For everyone else it reads
//! as "no share of mine".

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{IdentityProvider, RequestContext};
use crate::crypto::Codec;
use crate::error::{Error, Result};
use crate::models::{DiagramItem, Share, ShareCondition};
use crate::policy::{filter_allow_ip_list, hash_password};
use crate::share::{encode_transport, ShareTokenService};
use crate::storage::{finish, ItemQuery, Repositories, Session};

/// Parameters of a new share link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub item_id: String,
    /// Share the public copy instead of the private one.
    #[serde(default)]
    pub is_public: bool,
    /// Link lifetime in seconds.
    pub expire_second: i64,
    /// Plain password; empty for none.
    #[serde(default)]
    pub password: String,
    #[serde(rename = "allowIPList", default)]
    pub allow_ip_list: Vec<String>,
    #[serde(default)]
    pub allow_email_list: Vec<String>,
}

pub struct DiagramService {
    repos: Repositories,
    codec: Arc<Codec>,
    tokens: Arc<ShareTokenService>,
    identity: Arc<dyn IdentityProvider>,
    bcrypt_cost: u32,
}

impl DiagramService {
    pub fn new(
        repos: Repositories,
        codec: Arc<Codec>,
        tokens: Arc<ShareTokenService>,
        identity: Arc<dyn IdentityProvider>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repos,
            codec,
            tokens,
            identity,
            bcrypt_cost,
        }
    }

    /// Codec for building items from plain text and reading them back.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Decrypted text of `item`, or the invalid-text sentinel.
    pub fn text(&self, item: &DiagramItem) -> String {
        item.text(&self.codec)
    }

    // ========== Items ==========

    pub async fn find_by_id(
        &self,
        ctx: &RequestContext,
        item_id: &str,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let user = ctx.require_user()?;
        self.repos
            .items
            .find_by_id(&mut Session::ambient(), &user.user_id, item_id, is_public)
            .await
    }

    pub async fn find(&self, ctx: &RequestContext, query: ItemQuery) -> Result<Vec<DiagramItem>> {
        let user = ctx.require_user()?;
        self.repos
            .items
            .find(&mut Session::ambient(), &user.user_id, query)
            .await
    }

    /// Save the caller's private copy and, with `is_public`, the public copy.
    ///
    /// Publishing an item whose public copy belongs to someone else fails
    /// with `Forbidden`. When saving a new item fails, whatever was written
    /// is deleted again on a best-effort basis.
    pub async fn save(
        &self,
        ctx: &RequestContext,
        mut item: DiagramItem,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let user = ctx.require_user()?;
        let user_id = user.user_id.as_str();

        if is_public {
            if !self.is_public_diagram_owner(user_id, item.id()).await? {
                tracing::warn!(user_id, item_id = item.id(), "public item owned by another user");
                return Err(Error::forbidden("public item belongs to another user"));
            }
            item.publish();
        }

        let manager = self.repos.transactions.as_ref();
        let mut session = manager.begin().await?;
        let outcome = self.save_copies(&mut session, user_id, &item, is_public).await;
        let result = finish(manager, session, outcome).await;

        match &result {
            Ok(saved) => {
                tracing::info!(user_id, item_id = saved.id(), is_public, "item saved");
            }
            Err(err) if item.is_new() => {
                tracing::warn!(user_id, item_id = item.id(), error = %err, "saving new item failed");
                self.compensate_new_item(user_id, item.id(), is_public).await;
            }
            Err(_) => {}
        }
        result
    }

    async fn save_copies(
        &self,
        session: &mut Session,
        user_id: &str,
        item: &DiagramItem,
        is_public: bool,
    ) -> Result<DiagramItem> {
        let saved = self.repos.items.save(session, user_id, item, false).await?;
        if is_public {
            self.repos.items.save(session, user_id, &saved, true).await?;
        }
        Ok(saved)
    }

    async fn compensate_new_item(&self, user_id: &str, item_id: &str, is_public: bool) {
        let mut session = Session::ambient();
        if let Err(err) = self
            .repos
            .items
            .delete(&mut session, user_id, item_id, false)
            .await
        {
            tracing::warn!(user_id, item_id, error = %err, "cleanup of new item failed");
        }
        if is_public {
            if let Err(err) = self
                .repos
                .items
                .delete(&mut session, user_id, item_id, true)
                .await
            {
                tracing::warn!(user_id, item_id, error = %err, "cleanup of new public item failed");
            }
        }
    }

    /// A missing public copy is no conflict. An existing one belongs to the
    /// caller iff the caller also holds the private copy.
    async fn is_public_diagram_owner(&self, user_id: &str, item_id: &str) -> Result<bool> {
        let mut session = Session::ambient();
        match self
            .repos
            .items
            .find_by_id(&mut session, user_id, item_id, true)
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(true),
            Err(err) => return Err(err),
        }

        match self
            .repos
            .items
            .find_by_id(&mut session, user_id, item_id, false)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Delete the private copy and any share of the item; with `is_public`
    /// also the public copy.
    pub async fn delete(&self, ctx: &RequestContext, item_id: &str, is_public: bool) -> Result<()> {
        let user = ctx.require_user()?;
        let user_id = user.user_id.as_str();
        let share_id = self.tokens.share_id(item_id)?;

        let manager = self.repos.transactions.as_ref();
        let mut session = manager.begin().await?;
        let outcome = self
            .delete_all(&mut session, user_id, item_id, &share_id, is_public)
            .await;
        finish(manager, session, outcome).await?;

        tracing::info!(user_id, item_id, is_public, "item deleted");
        Ok(())
    }

    async fn delete_all(
        &self,
        session: &mut Session,
        user_id: &str,
        item_id: &str,
        share_id: &str,
        is_public: bool,
    ) -> Result<()> {
        if is_public {
            self.repos.items.delete(session, user_id, item_id, true).await?;
        }
        self.repos.items.delete(session, user_id, item_id, false).await?;
        match self.repos.shares.delete(session, user_id, share_id).await {
            Err(Error::Forbidden(_)) => {
                tracing::debug!(user_id, item_id, "share id held by another user");
                Ok(())
            }
            other => other,
        }
    }

    /// Set the bookmark flag on the caller's private copy.
    pub async fn bookmark(
        &self,
        ctx: &RequestContext,
        item_id: &str,
        is_bookmark: bool,
    ) -> Result<DiagramItem> {
        let user = ctx.require_user()?;
        let mut session = Session::ambient();
        let mut item = self
            .repos
            .items
            .find_by_id(&mut session, &user.user_id, item_id, false)
            .await?;
        item.bookmark(is_bookmark);
        self.repos
            .items
            .save(&mut session, &user.user_id, &item, false)
            .await
    }

    // ========== Shares ==========

    /// Snapshot the item behind a signed link; returns the transport token.
    pub async fn share(&self, ctx: &RequestContext, request: &ShareRequest) -> Result<String> {
        let user = ctx.require_user()?;
        let user_id = user.user_id.as_str();
        let item_id = request.item_id.as_str();
        let mut session = Session::ambient();

        if request.expire_second <= 0 {
            return Err(Error::invalid("expireSecond must be positive"));
        }
        if request.is_public && !self.is_public_diagram_owner(user_id, item_id).await? {
            return Err(Error::forbidden("public item belongs to another user"));
        }
        let item = self
            .repos
            .items
            .find_by_id(&mut session, user_id, item_id, request.is_public)
            .await?;

        let allow_ip_list = filter_allow_ip_list(&request.allow_ip_list);
        let share_id = self.tokens.share_id(item.id())?;
        let signed = self.tokens.sign(
            &share_id,
            request.expire_second,
            !request.password.is_empty(),
            !request.allow_email_list.is_empty(),
        )?;

        let share = Share {
            password: hash_password(&request.password, self.bcrypt_cost)?,
            allow_ip_list,
            allow_email_list: request.allow_email_list.clone(),
            expire_time: signed.expire_time_millis(),
            token: signed.token,
        };
        match self
            .repos
            .shares
            .save(&mut session, user_id, &share_id, &item, &share)
            .await
        {
            Err(Error::Forbidden(_)) => {
                tracing::warn!(user_id, item_id, share_id, "share id held by another user");
                return Err(Error::forbidden(format!(
                    "item id {item_id} is already shared by another user"
                )));
            }
            other => other?,
        }

        tracing::info!(user_id, item_id, share_id, "item shared");
        Ok(encode_transport(&share.token))
    }

    /// Resolve a share link to its item snapshot.
    ///
    /// Checks, stopping at the first failure: token signature and expiry,
    /// caller IP, caller email, password.
    pub async fn find_share_item(
        &self,
        ctx: &RequestContext,
        token: &str,
        password: &str,
    ) -> Result<DiagramItem> {
        let claims = self.tokens.verify_encoded(token)?;
        let share_id = claims.sub.as_str();
        let shared = self
            .repos
            .shares
            .find(&mut Session::ambient(), share_id)
            .await?;
        let share = &shared.share;

        if share.expire_time < Utc::now().timestamp_millis() {
            return Err(Error::UrlExpired);
        }

        if !share.check_ip_within_range(&ctx.remote_ip) {
            tracing::warn!(share_id, remote_ip = %ctx.remote_ip, "share denied by ip policy");
            return Err(Error::forbidden("ip address is not allowed"));
        }

        if !share.allow_email_list.is_empty() {
            // The token's `check_email` claim tells clients to sign in first.
            let user = ctx.user.as_ref().ok_or(Error::NoAuthorization)?;
            let email = self.identity.email(&user.user_id).await?;
            if !email.is_some_and(|email| share.valid_email(&email)) {
                tracing::warn!(share_id, "share denied by email policy");
                return Err(Error::forbidden("email address is not allowed"));
            }
        }

        if claims.check_password || share.uses_password() {
            if password.is_empty() {
                return Err(Error::forbidden("password is required"));
            }
            if !share.compare_password(password) {
                tracing::warn!(share_id, "share denied by password");
                return Err(Error::forbidden("password does not match"));
            }
        }

        Ok(shared.item)
    }

    /// Current sharing settings of one of the caller's items.
    pub async fn find_share_condition(
        &self,
        ctx: &RequestContext,
        item_id: &str,
    ) -> Result<ShareCondition> {
        let user = ctx.require_user()?;
        let share_id = self.tokens.share_id(item_id)?;
        let shared = self
            .repos
            .shares
            .find(&mut Session::ambient(), &share_id)
            .await?;
        if shared.owner != user.user_id {
            return Err(Error::not_found(format!("share of item {item_id}")));
        }
        Ok(shared.share.condition(encode_transport(&shared.share.token)))
    }

    /// Remove the share of one of the caller's items. Succeeds if there is none.
    pub async fn revoke_share(&self, ctx: &RequestContext, item_id: &str) -> Result<()> {
        let user = ctx.require_user()?;
        let share_id = self.tokens.share_id(item_id)?;
        match self
            .repos
            .shares
            .delete(&mut Session::ambient(), &user.user_id, &share_id)
            .await
        {
            Err(Error::Forbidden(_)) => {
                tracing::debug!(
                    user_id = %user.user_id,
                    item_id,
                    "no share of the caller to revoke"
                );
                return Ok(());
            }
            other => other?,
        }
        tracing::info!(user_id = %user.user_id, item_id, "share revoked");
        Ok(())
    }
}
