//! Unified application error type.
//!
//! Every fallible layer (repository, auth, handlers) maps its failures into
//! [`ApiError`] so the whole application speaks one error language and every
//! failure reaches the client as structured JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// The error taxonomy surfaced to API clients.
///
/// Conflicts caused by the review uniqueness constraint are carried as their
/// own variant so the repository can distinguish them from generic database
/// failures, but they render with the same 400 status as validation errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or duplicate field in the request payload (400).
    #[error("{0}")]
    Validation(String),

    /// Referenced user/title/review/comment does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Request carries no valid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the permission evaluator denied the action (403).
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation raced past the application pre-check (400).
    #[error("{0}")]
    Conflict(String),

    /// Underlying database failure (500).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else that should never reach a client in detail (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The uppercase kind tag placed in the JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for this error. Conflicts deliberately share the 400
    /// status of validation errors; the duplicate-review rule is a payload
    /// problem from the client's point of view.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a sqlx error while inspecting unique violations, so a race past
    /// the application-level duplicate check still surfaces as a conflict
    /// instead of a 500.
    pub fn from_sqlx_with_conflict(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::conflict(conflict_message);
            }
        }
        Self::Database(err)
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal detail (SQL text, pool errors) stays in the logs; clients
        // get a generic message for 5xx.
        let message = match &self {
            Self::Database(e) => {
                tracing::error!("database error: {e:?}");
                "internal server error".to_string()
            }
            Self::Internal(m) => {
                tracing::error!("internal error: {m}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
