// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Share Tokens
//!
//! A share link carries a signed token whose subject is the *share id*, a
//! keyed hash of the item id. The raw item id never appears in the link and
//! share records are looked up by share id only, so links cannot be
//! enumerated from item ids.
//!
//! Tokens are RS512 JWTs, base64url-encoded (no padding) for transport.

pub mod token;

pub use token::{decode_transport, encode_transport, ShareClaims, ShareTokenService, SignedToken};
