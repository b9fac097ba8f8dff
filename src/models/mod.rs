// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Backend-neutral entities. Storage adapters convert to and from their own
//! native representations; nothing in here knows about a particular backend.
//!
//! - **Diagram items**: encrypted diagram documents ([`DiagramItem`])
//! - **Shares**: snapshot + access policy behind a share link ([`Share`])
//! - **Settings**: per-user, per-diagram display preferences ([`Settings`])
//! - **Gists**: bookmarked external gists ([`GistItem`])

pub mod diagram;
pub mod gist;
pub mod item;
pub mod settings;
pub mod share;

pub use diagram::Diagram;
pub use gist::GistItem;
pub use item::{DiagramItem, DiagramItemBuilder};
pub use settings::{Color, Settings};
pub use share::{Share, ShareCondition};
