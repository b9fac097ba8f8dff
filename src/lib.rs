// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Diagram Store - Encrypted Diagram Persistence & Share Tokens
//!
//! Stores user diagrams with their text encrypted at rest, publishes public
//! copies, and resolves signed, expiring share links guarded by IP, email
//! and password policies.
//!
//! ## Modules
//!
//! - `auth` - Caller identity handed in by the transport layer
//! - `config` - Environment configuration
//! - `crypto` - AES-256-CBC codec for diagram text
//! - `models` - Diagram items, shares, settings, gists
//! - `policy` - Share access checks (IP/CIDR, email, bcrypt password)
//! - `service` - Diagram, gist and settings services
//! - `share` - Share ids and RS512 share tokens
//! - `storage` - Document, relational and embedded backends plus blob store
//! - `telemetry` - Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod policy;
pub mod service;
pub mod share;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use service::Services;
