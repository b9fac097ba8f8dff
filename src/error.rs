// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-wide error taxonomy.
//!
//! Every layer returns [`Error`]. Transport layers only ever see the
//! [`ErrorKind`] and a public message; backend details stay in the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::crypto::CodecError;

/// Coarse error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    UrlExpired,
    NoAuthorization,
    EncryptionFailed,
    DecryptionFailed,
    InvalidParameter,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::UrlExpired => "url_expired",
            ErrorKind::NoAuthorization => "no_authorization",
            ErrorKind::EncryptionFailed => "encryption_failed",
            ErrorKind::DecryptionFailed => "decryption_failed",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::Internal => "internal_error",
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden | ErrorKind::UrlExpired => StatusCode::FORBIDDEN,
            ErrorKind::NoAuthorization => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidParameter => StatusCode::BAD_REQUEST,
            ErrorKind::EncryptionFailed | ErrorKind::DecryptionFailed | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Not found",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::UrlExpired => "URL has expired",
            ErrorKind::NoAuthorization => "Not authorized",
            ErrorKind::EncryptionFailed => "Encryption failed",
            ErrorKind::DecryptionFailed => "Decryption failed",
            ErrorKind::InvalidParameter => "Invalid parameter",
            ErrorKind::Internal => "Internal error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("share url has expired")]
    UrlExpired,

    #[error("no authorization")]
    NoAuthorization,

    #[error("encryption failed: {0}")]
    EncryptionFailed(CodecError),

    #[error("decryption failed: {0}")]
    DecryptionFailed(CodecError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::UrlExpired => ErrorKind::UrlExpired,
            Error::NoAuthorization => ErrorKind::NoAuthorization,
            Error::EncryptionFailed(_) => ErrorKind::EncryptionFailed,
            Error::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Error::NotFound(entity.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Error::Forbidden(reason.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Join several validation failures into one `InvalidParameter`.
    pub fn join(errors: Vec<Error>) -> Self {
        let message = errors
            .iter()
            .map(|e| match e {
                Error::InvalidParameter(msg) => msg.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Error::InvalidParameter(message)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(e.to_string())
        } else {
            Error::Internal(format!("I/O error: {e}"))
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization error: {e}"))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Error::NotFound("row".to_string()),
            other => Error::Internal(format!("database error: {other}")),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Error::Internal(format!("migration error: {e}"))
    }
}

impl From<object_store::Error> for Error {
    fn from(e: object_store::Error) -> Self {
        match e {
            object_store::Error::NotFound { path, .. } => Error::NotFound(path),
            other => Error::Internal(format!("object storage error: {other}")),
        }
    }
}

macro_rules! redb_into_internal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Error::Internal(format!("redb error: {e}"))
                }
            }
        )*
    };
}

redb_into_internal!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind.status_code().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorBody {
            error: kind.public_message().to_string(),
            error_code: kind.code().to_string(),
        });
        (kind.status_code(), body).into_response()
    }
}
