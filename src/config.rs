// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the immutable [`Config`] built
//! from them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ENCRYPTION_KEY` | 32-byte AES-256 key for diagram text | Required |
//! | `SHARE_SECRET` | HMAC secret for share id derivation | Required |
//! | `SHARE_PRIVATE_KEY_FILE` | RSA private key (PEM) signing share tokens | Required |
//! | `SHARE_PUBLIC_KEY_FILE` | RSA public key (PEM) verifying share tokens | Required |
//! | `STORAGE_BACKEND` | `document`, `relational` or `embedded` | `embedded` |
//! | `DATA_DIR` | Root directory for local data | `./data` |
//! | `DATABASE_URL` | SQLite database file for the relational backend | `<DATA_DIR>/diagrams.sqlite` |
//! | `BLOB_STORE` | `none`, `memory`, `local` or `s3` | `none` |
//! | `BLOB_STORE_PATH` | Directory for the `local` blob store | `<DATA_DIR>/blobs` |
//! | `S3_ENDPOINT` / `S3_BUCKET` / `S3_ACCESS_KEY` / `S3_SECRET_KEY` | S3 blob store | Required for `s3` |
//! | `S3_REGION` | S3 region | `us-east-1` |
//! | `BCRYPT_COST` | bcrypt work factor for share passwords | `12` |
//! | `DOCUMENT_CACHE_CAPACITY` | Document store read cache entries | `100` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::crypto::{CodecError, EncryptionKey};

pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";
pub const SHARE_SECRET_ENV: &str = "SHARE_SECRET";
pub const SHARE_PRIVATE_KEY_FILE_ENV: &str = "SHARE_PRIVATE_KEY_FILE";
pub const SHARE_PUBLIC_KEY_FILE_ENV: &str = "SHARE_PUBLIC_KEY_FILE";

/// Which metadata backend the repositories are built on.
pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

/// Root for the document store collections and the embedded database file.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const EMBEDDED_DB_FILE: &str = "diagrams.redb";
pub const RELATIONAL_DB_FILE: &str = "diagrams.sqlite";

pub const BLOB_STORE_ENV: &str = "BLOB_STORE";
pub const BLOB_STORE_PATH_ENV: &str = "BLOB_STORE_PATH";
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const S3_BUCKET_ENV: &str = "S3_BUCKET";
pub const S3_ACCESS_KEY_ENV: &str = "S3_ACCESS_KEY";
pub const S3_SECRET_KEY_ENV: &str = "S3_SECRET_KEY";
pub const S3_REGION_ENV: &str = "S3_REGION";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";

pub const DOCUMENT_CACHE_CAPACITY_ENV: &str = "DOCUMENT_CACHE_CAPACITY";
pub const DEFAULT_DOCUMENT_CACHE_CAPACITY: usize = 100;

/// `json` for structured logs, anything else for human-readable output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("could not read {var} at {path}: {source}")]
    Unreadable {
        var: &'static str,
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    Document,
    Relational,
    #[default]
    Embedded,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(StorageBackend::Document),
            "relational" => Ok(StorageBackend::Relational),
            "embedded" => Ok(StorageBackend::Embedded),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Object store holding gzip-compressed item text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobStoreConfig {
    /// In-memory storage (for testing)
    Memory,

    /// Local filesystem storage
    Local { path: PathBuf },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        region: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub document_cache_capacity: NonZeroUsize,
    pub blob_store: Option<BlobStoreConfig>,
}

/// Secret material for share links.
#[derive(Clone)]
pub struct ShareKeys {
    pub secret: String,
    pub private_key_pem: Vec<u8>,
    pub public_key_pem: Vec<u8>,
}

impl fmt::Debug for ShareKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareKeys")
            .field("secret", &"<redacted>")
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem_len", &self.public_key_pem.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub encryption_key: EncryptionKey,
    pub share: ShareKeys,
    pub storage: StorageConfig,
    pub bcrypt_cost: u32,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let encryption_key = EncryptionKey::new(required(ENCRYPTION_KEY_ENV)?.as_bytes())
            .map_err(|e: CodecError| ConfigError::Invalid {
                var: ENCRYPTION_KEY_ENV,
                reason: e.to_string(),
            })?;

        let share = ShareKeys {
            secret: required(SHARE_SECRET_ENV)?,
            private_key_pem: read_file(
                SHARE_PRIVATE_KEY_FILE_ENV,
                &required(SHARE_PRIVATE_KEY_FILE_ENV)?,
            )?,
            public_key_pem: read_file(
                SHARE_PUBLIC_KEY_FILE_ENV,
                &required(SHARE_PUBLIC_KEY_FILE_ENV)?,
            )?,
        };

        let backend = match var(STORAGE_BACKEND_ENV) {
            Some(v) => v.parse().map_err(|reason| ConfigError::Invalid {
                var: STORAGE_BACKEND_ENV,
                reason,
            })?,
            None => StorageBackend::default(),
        };
        let data_dir = PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let database_url = var(DATABASE_URL_ENV).unwrap_or_else(|| {
            data_dir.join(RELATIONAL_DB_FILE).to_string_lossy().into_owned()
        });

        let document_cache_capacity = match var(DOCUMENT_CACHE_CAPACITY_ENV) {
            Some(v) => v
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::Invalid {
                    var: DOCUMENT_CACHE_CAPACITY_ENV,
                    reason: e.to_string(),
                })?,
            None => NonZeroUsize::new(DEFAULT_DOCUMENT_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
        };

        let blob_store = match var(BLOB_STORE_ENV)
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("none") => None,
            Some("memory") => Some(BlobStoreConfig::Memory),
            Some("local") => Some(BlobStoreConfig::Local {
                path: var(BLOB_STORE_PATH_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_dir.join("blobs")),
            }),
            Some("s3") => Some(BlobStoreConfig::S3 {
                endpoint: required(S3_ENDPOINT_ENV)?,
                access_key: required(S3_ACCESS_KEY_ENV)?,
                secret_key: required(S3_SECRET_KEY_ENV)?,
                bucket: required(S3_BUCKET_ENV)?,
                region: var(S3_REGION_ENV).unwrap_or_else(|| DEFAULT_S3_REGION.into()),
            }),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: BLOB_STORE_ENV,
                    reason: format!("unknown blob store '{other}'"),
                })
            }
        };

        let bcrypt_cost = match var(BCRYPT_COST_ENV) {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| ConfigError::Invalid {
                    var: BCRYPT_COST_ENV,
                    reason: format!("'{v}' is not a cost between 4 and 31"),
                })?,
            None => bcrypt::DEFAULT_COST,
        };

        let log_format = var(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            encryption_key,
            share,
            storage: StorageConfig {
                backend,
                data_dir,
                database_url,
                document_cache_capacity,
                blob_store,
            },
            bcrypt_cost,
            log_format,
        })
    }
}

fn read_file(var: &'static str, path: &str) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Unreadable {
        var,
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        let testdata = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata");
        HashMap::from([
            (ENCRYPTION_KEY_ENV, "0123456789abcdef0123456789abcdef".to_string()),
            (SHARE_SECRET_ENV, "share-secret".to_string()),
            (
                SHARE_PRIVATE_KEY_FILE_ENV,
                format!("{testdata}/share_private.pem"),
            ),
            (
                SHARE_PUBLIC_KEY_FILE_ENV,
                format!("{testdata}/share_public.pem"),
            ),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Embedded);
        assert_eq!(config.storage.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert!(config.storage.database_url.ends_with(RELATIONAL_DB_FILE));
        assert_eq!(config.storage.document_cache_capacity.get(), 100);
        assert_eq!(config.storage.blob_store, None);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.share.private_key_pem.starts_with(b"-----BEGIN"));
    }

    #[test]
    fn missing_key_is_named() {
        let mut env = base_env();
        env.remove(ENCRYPTION_KEY_ENV);
        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENCRYPTION_KEY_ENV)));
    }

    #[test]
    fn short_key_is_rejected() {
        let mut env = base_env();
        env.insert(ENCRYPTION_KEY_ENV, "short".into());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { var: ENCRYPTION_KEY_ENV, .. }
        ));
    }

    #[test]
    fn backend_and_blob_store_selection() {
        let mut env = base_env();
        env.insert(STORAGE_BACKEND_ENV, "Relational".into());
        env.insert(DATA_DIR_ENV, "/tmp/diagrams".into());
        env.insert(BLOB_STORE_ENV, "local".into());
        env.insert(LOG_FORMAT_ENV, "JSON".into());
        let config = load(&env).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Relational);
        assert_eq!(
            config.storage.blob_store,
            Some(BlobStoreConfig::Local {
                path: PathBuf::from("/tmp/diagrams/blobs")
            })
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn s3_requires_bucket() {
        let mut env = base_env();
        env.insert(BLOB_STORE_ENV, "s3".into());
        env.insert(S3_ENDPOINT_ENV, "http://localhost:9000".into());
        env.insert(S3_ACCESS_KEY_ENV, "minio".into());
        env.insert(S3_SECRET_KEY_ENV, "minio123".into());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Missing(S3_BUCKET_ENV)
        ));
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut env = base_env();
        env.insert(STORAGE_BACKEND_ENV, "mongo".into());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { var: STORAGE_BACKEND_ENV, .. }
        ));

        let mut env = base_env();
        env.insert(BCRYPT_COST_ENV, "2".into());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { var: BCRYPT_COST_ENV, .. }
        ));
    }

    #[test]
    fn unreadable_key_file() {
        let mut env = base_env();
        env.insert(SHARE_PUBLIC_KEY_FILE_ENV, "/nonexistent/key.pem".into());
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Unreadable { var: SHARE_PUBLIC_KEY_FILE_ENV, .. }
        ));
    }

    #[test]
    fn share_keys_debug_is_redacted() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config.share);
        assert!(!debug.contains("share-secret"));
        assert!(!debug.contains("BEGIN"));
    }
}
