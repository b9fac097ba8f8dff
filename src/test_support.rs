// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use crate::config::ShareKeys;
use crate::crypto::{Codec, EncryptionKey, KEY_LEN};
use crate::share::ShareTokenService;

pub(crate) const SHARE_PRIVATE_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/share_private.pem"));
pub(crate) const SHARE_PUBLIC_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/share_public.pem"));
/// Public half of an unrelated key pair.
pub(crate) const OTHER_PUBLIC_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/other_public.pem"));

/// Lowest cost bcrypt accepts.
pub(crate) const TEST_BCRYPT_COST: u32 = 4;

pub(crate) fn share_keys() -> ShareKeys {
    ShareKeys {
        secret: "test-share-secret".into(),
        private_key_pem: SHARE_PRIVATE_PEM.as_bytes().to_vec(),
        public_key_pem: SHARE_PUBLIC_PEM.as_bytes().to_vec(),
    }
}

pub(crate) fn token_service() -> ShareTokenService {
    ShareTokenService::from_keys(&share_keys()).unwrap()
}

pub(crate) fn codec() -> Codec {
    Codec::new(EncryptionKey::new(&[7u8; KEY_LEN]).unwrap())
}
