// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::ShareKeys;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in a share token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareClaims {
    /// Unique token id.
    pub jti: String,
    /// Share id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub check_password: bool,
    pub check_email: bool,
}

/// A freshly signed token and the expiry it was signed with.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// Compact JWT, not yet transport-encoded.
    pub token: String,
    pub claims: ShareClaims,
}

impl SignedToken {
    /// Expiry in epoch milliseconds, as stored on the share record.
    pub fn expire_time_millis(&self) -> i64 {
        self.claims.exp.saturating_mul(1000)
    }
}

/// Derives share ids and signs/verifies share tokens.
#[derive(Clone)]
pub struct ShareTokenService {
    secret: Vec<u8>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for ShareTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareTokenService").finish_non_exhaustive()
    }
}

impl ShareTokenService {
    /// Build from a share secret and a PEM-encoded RSA key pair.
    pub fn new(secret: &[u8], private_key_pem: &[u8], public_key_pem: &[u8]) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| Error::internal(format!("invalid share signing key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| Error::internal(format!("invalid share verification key: {e}")))?;
        Ok(Self {
            secret: secret.to_vec(),
            encoding_key,
            decoding_key,
        })
    }

    pub fn from_keys(keys: &ShareKeys) -> Result<Self> {
        Self::new(
            keys.secret.as_bytes(),
            &keys.private_key_pem,
            &keys.public_key_pem,
        )
    }

    /// `hex(HMAC-SHA256(secret, item_id))`.
    pub fn share_id(&self, item_id: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::internal(format!("share secret rejected: {e}")))?;
        mac.update(item_id.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Sign a token for `share_id` valid for `ttl_seconds` from now.
    pub fn sign(
        &self,
        share_id: &str,
        ttl_seconds: i64,
        check_password: bool,
        check_email: bool,
    ) -> Result<SignedToken> {
        self.sign_at(Utc::now(), share_id, ttl_seconds, check_password, check_email)
    }

    pub fn sign_at(
        &self,
        issued_at: DateTime<Utc>,
        share_id: &str,
        ttl_seconds: i64,
        check_password: bool,
        check_email: bool,
    ) -> Result<SignedToken> {
        let iat = issued_at.timestamp();
        let claims = ShareClaims {
            jti: Uuid::new_v4().to_string(),
            sub: share_id.to_string(),
            iat,
            exp: iat.saturating_add(ttl_seconds),
            check_password,
            check_email,
        };
        let token = encode(&Header::new(Algorithm::RS512), &claims, &self.encoding_key)
            .map_err(|e| Error::internal(format!("share token signing failed: {e}")))?;
        Ok(SignedToken { token, claims })
    }

    /// Verify signature and expiry of a compact JWT.
    ///
    /// Every failure is reported as [`Error::UrlExpired`].
    pub fn verify(&self, token: &str) -> Result<ShareClaims> {
        let mut validation = Validation::new(Algorithm::RS512);
        validation.leeway = 0;
        validation.validate_aud = false;

        decode::<ShareClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "share token rejected");
                Error::UrlExpired
            })
    }

    /// Verify a transport-encoded token.
    pub fn verify_encoded(&self, encoded: &str) -> Result<ShareClaims> {
        let token = decode_transport(encoded)?;
        self.verify(&token)
    }
}

/// base64url without padding.
pub fn encode_transport(token: &str) -> String {
    Base64UrlUnpadded::encode_string(token.as_bytes())
}

pub fn decode_transport(encoded: &str) -> Result<String> {
    let bytes = Base64UrlUnpadded::decode_vec(encoded).map_err(|_| Error::UrlExpired)?;
    String::from_utf8(bytes).map_err(|_| Error::UrlExpired)
}
