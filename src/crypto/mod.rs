// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric encryption of diagram text.
//!
//! Diagram source is never persisted in plaintext. The [`Codec`] holds the
//! process-wide key (loaded once from configuration) and is shared by
//! reference into every component that needs to encrypt or decrypt.

pub mod codec;

pub use codec::{Codec, CodecError, EncryptionKey, INVALID_TEXT, KEY_LEN};
