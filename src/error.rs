use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::Envelope;

/// Outcome category of a core operation, independent of HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalError,
}

impl StatusClass {
    pub fn http_status(self) -> StatusCode {
        match self {
            StatusClass::Ok => StatusCode::OK,
            StatusClass::BadRequest => StatusCode::BAD_REQUEST,
            StatusClass::Unauthorized => StatusCode::UNAUTHORIZED,
            StatusClass::Forbidden => StatusCode::FORBIDDEN,
            StatusClass::NotFound => StatusCode::NOT_FOUND,
            StatusClass::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by the credential and account services.
///
/// The message is what callers see; store and hashing details are logged
/// where they happen and never end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotAuthenticated(String),
    #[error("{0}")]
    BadCredentials(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusClass {
        match self {
            ServiceError::InvalidInput(_) => StatusClass::BadRequest,
            ServiceError::NotAuthenticated(_) => StatusClass::Unauthorized,
            ServiceError::BadCredentials(_) => StatusClass::BadRequest,
            ServiceError::Conflict(_) => StatusClass::Forbidden,
            ServiceError::NotFound(_) => StatusClass::NotFound,
            ServiceError::Internal(_) => StatusClass::InternalError,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        Envelope::<()>::error(self.to_string(), self.status().http_status()).into_response()
    }
}

/// Failure reported by a [`crate::users::repo::UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::UniqueViolation
            }
            other => StoreError::Backend(other.into()),
        }
    }
}
