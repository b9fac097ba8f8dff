// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-CBC with PKCS#7 padding.
//!
//! Wire format: `hex(iv || ciphertext)` where `iv` is 16 random bytes
//! generated per call.

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

const BLOCK_LEN: usize = 16;
const IV_LEN: usize = BLOCK_LEN;

/// Substituted for text that cannot be decrypted on read paths.
pub const INVALID_TEXT: &str = "invalid text";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("encryption key must be {KEY_LEN} bytes, got {0}")]
    InvalidKey(usize),

    #[error("ciphertext is not valid hex")]
    Encoding,

    #[error("ciphertext length is not a whole number of blocks")]
    BlockSize,

    #[error("invalid padding")]
    Unpad,

    #[error("decrypted text is not valid UTF-8")]
    Utf8,
}

/// Fixed-length AES-256 key.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn new(bytes: &[u8]) -> Result<Self, CodecError> {
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CodecError::InvalidKey(bytes.len()))?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Encrypts and decrypts diagram text with one key.
#[derive(Debug, Clone)]
pub struct Codec {
    key: EncryptionKey,
}

impl Codec {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let iv: [u8; IV_LEN] = rand::random();
        let encryptor = Aes256CbcEnc::new_from_slices(&self.key.0, &iv)
            .map_err(|_| CodecError::InvalidKey(self.key.0.len()))?;
        let body = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut out = Vec::with_capacity(IV_LEN + body.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&body);
        Ok(hex::encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        let raw = hex::decode(ciphertext).map_err(|_| CodecError::Encoding)?;
        if raw.len() < IV_LEN + BLOCK_LEN || (raw.len() - IV_LEN) % BLOCK_LEN != 0 {
            return Err(CodecError::BlockSize);
        }

        let (iv, body) = raw.split_at(IV_LEN);
        let decryptor = Aes256CbcDec::new_from_slices(&self.key.0, iv)
            .map_err(|_| CodecError::InvalidKey(self.key.0.len()))?;
        let plain = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| CodecError::Unpad)?;

        String::from_utf8(plain).map_err(|_| CodecError::Utf8)
    }

    /// Decrypt, substituting [`INVALID_TEXT`] on failure.
    pub fn decrypt_or_invalid(&self, ciphertext: &str) -> String {
        match self.decrypt(ciphertext) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decrypt diagram text");
                INVALID_TEXT.to_string()
            }
        }
    }
}
