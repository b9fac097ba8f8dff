// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Identity
//!
//! Credential verification happens upstream. By the time a call reaches the
//! services it carries, at most, a verified user id and the caller's remote
//! address. Services only check that an identity is *present* and that it
//! *owns* what it touches.
//!
//! Email addresses are resolved on demand through an [`IdentityProvider`],
//! used by share links restricted to an email allow-list.

pub mod context;
pub mod identity;

pub use context::{AuthenticatedUser, RequestContext};
pub use identity::{IdentityProvider, StaticIdentityProvider};
