//! Error types for aimclub-recruit
//!
//! Validation and not-found errors surface to callers as actionable messages.
//! Notification errors never escape a lifecycle operation; they are converted
//! into a `NotificationOutcome` beside the successful mutation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::notify::NotificationError;

/// Main error type for the recruitment service
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed a guard; raised before any store or notifier call
    #[error("{0}")]
    Validation(String),

    /// A generated identifier collided with an existing unique value
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Target record or token does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Outbound notification failed
    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// Admin gate rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] aimclub_common::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the recruitment Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Notification(_) => StatusCode::BAD_GATEWAY,
            Error::Common(aimclub_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Common(aimclub_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
