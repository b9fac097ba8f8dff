// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Canonical user id from the identity provider.
    pub user_id: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Per-call context threaded into every service method.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<AuthenticatedUser>,
    /// Caller address as seen by the transport layer; may be empty.
    pub remote_ip: String,
}

impl RequestContext {
    pub fn anonymous(remote_ip: impl Into<String>) -> Self {
        Self {
            user: None,
            remote_ip: remote_ip.into(),
        }
    }

    pub fn authenticated(user_id: impl Into<String>, remote_ip: impl Into<String>) -> Self {
        Self {
            user: Some(AuthenticatedUser::new(user_id)),
            remote_ip: remote_ip.into(),
        }
    }

    /// The caller, or [`Error::NoAuthorization`].
    pub fn require_user(&self) -> Result<&AuthenticatedUser> {
        self.user.as_ref().ok_or(Error::NoAuthorization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_has_no_user() {
        let ctx = RequestContext::anonymous("10.0.0.1");
        assert!(matches!(ctx.require_user(), Err(Error::NoAuthorization)));
    }

    #[test]
    fn authenticated_context_yields_user() {
        let ctx = RequestContext::authenticated("user-1", "");
        assert_eq!(ctx.require_user().unwrap().user_id, "user-1");
    }
}
