// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence of diagram items, share records, settings and gists.
//!
//! ## Backends
//!
//! | Backend      | Metadata                         | Module         |
//! |--------------|----------------------------------|----------------|
//! | `document`   | JSON files under `DATA_DIR`      | [`document`]   |
//! | `relational` | SQLite database (`sqlx`)         | [`relational`] |
//! | `embedded`   | redb database file               | [`embedded`]   |
//!
//! Each backend implements the traits in [`repository`] and a
//! [`session::TransactionManager`]. Callers pick one at startup through
//! [`repository::Repositories::open`].
//!
//! ## Item Text
//!
//! When a [`blob::BlobStore`] is configured, item text is written there as
//! gzip objects and metadata records carry `saveToStorage = true` instead of
//! the text:
//!
//! ```text
//! users/{uid}/{item_id}.txt.gz          # private items
//! public/{item_id}.txt.gz               # public copies
//! shares/{share_id}/{item_id}.txt.gz    # share snapshots
//! ```

pub mod blob;
pub mod document;
pub mod embedded;
pub mod ownership;
pub mod paths;
pub mod relational;
pub mod repository;
pub mod session;

pub use blob::BlobStore;
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use repository::{
    GistRepository, ItemQuery, ItemRepository, Repositories, SettingsRepository, ShareRepository,
    SharedItem,
};
pub use session::{finish, Session, TransactionManager};
