// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for stored records.
//!
//! Records that several users can address (public copies, share records)
//! remember the user who wrote them. Mutations by anyone else are refused.

use crate::error::{Error, Result};

/// Trait for records that have an owner.
pub trait OwnedResource {
    /// The owner's user id.
    fn owner_user_id(&self) -> &str;

    /// Human-readable resource name used in errors.
    fn resource_name(&self) -> &'static str {
        "resource"
    }
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// # Errors
    /// Returns [`Error::Forbidden`] if `user_id` does not own the resource.
    fn verify_ownership(&self, user_id: &str) -> Result<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user_id: &str) -> Result<()> {
        if self.owner_user_id() == user_id {
            Ok(())
        } else {
            tracing::warn!(
                user_id,
                resource = self.resource_name(),
                "ownership check failed"
            );
            Err(Error::forbidden(format!(
                "{} belongs to another user",
                self.resource_name()
            )))
        }
    }
}

/// Verify ownership of an optional record; absence passes.
pub fn verify_if_present<T: OwnedResource>(record: Option<&T>, user_id: &str) -> Result<()> {
    match record {
        Some(record) => record.verify_ownership(user_id),
        None => Ok(()),
    }
}

/// Stored owner id of a record, for records that carry nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner<'a> {
    pub user_id: &'a str,
    pub resource: &'static str,
}

impl OwnedResource for Owner<'_> {
    fn owner_user_id(&self) -> &str {
        self.user_id
    }

    fn resource_name(&self) -> &'static str {
        self.resource
    }
}
