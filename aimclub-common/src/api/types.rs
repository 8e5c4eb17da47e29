//! Shared API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication parameters for GET/DELETE requests (query string)
///
/// `GET /api/admin/metrics?timestamp=1730000000000&hash=abc123...`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,
    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Authentication-only request body for POST/PUT without other fields
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthRequest {
    pub timestamp: i64,
    pub hash: String,
}

/// Error body returned as 400/401 when authentication fails
#[derive(Debug, Clone, Serialize)]
pub struct AuthErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AuthErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
