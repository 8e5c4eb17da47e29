//! Authentication middleware for admin routes
//!
//! GET and DELETE requests carry `timestamp` and `hash` in the query string;
//! POST and PUT carry them as fields of the JSON body. The hash covers the
//! whole body (or the two query fields) plus the request method and target,
//! with the shared secret appended.

use aimclub_common::api::{
    request_signing_value, signing_target, validate_hash, validate_timestamp, ApiAuthError,
    AuthQuery,
};
use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

/// Body limit for authenticated requests
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct AuthFields {
    timestamp: i64,
    hash: String,
}

/// Authentication middleware
///
/// Returns 401 when the timestamp or hash is wrong, 400 when they are missing.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // A zero secret disables checking entirely
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let method = request.method().as_str().to_string();
    let target = signing_target(request.uri().path(), request.uri().query());

    if matches!(*request.method(), Method::GET | Method::DELETE | Method::HEAD) {
        let Query(auth) = Query::<AuthQuery>::try_from_uri(request.uri())
            .map_err(|e| AuthError::MissingFields(e.body_text()))?;
        let signed = request_signing_value(
            json!({ "timestamp": auth.timestamp, "hash": auth.hash }),
            &method,
            &target,
        );
        check(auth.timestamp, &auth.hash, &signed, state.shared_secret)?;
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let json_value: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;

    let auth_fields: AuthFields = serde_json::from_value(json_value.clone())
        .map_err(|e| AuthError::MissingFields(format!("Missing auth fields: {}", e)))?;

    let signed = request_signing_value(json_value, &method, &target);
    check(auth_fields.timestamp, &auth_fields.hash, &signed, state.shared_secret)?;

    // Handlers read the body again
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn check(timestamp: i64, hash: &str, signed: &Value, shared_secret: i64) -> Result<(), AuthError> {
    validate_timestamp(timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        _ => AuthError::Other(e.to_string()),
    })?;

    validate_hash(hash, signed, shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash { provided, calculated } => {
            warn!(
                "Hash validation failed: provided={}, calculated={}",
                provided, calculated
            );
            AuthError::InvalidHash
        }
        _ => AuthError::Other(e.to_string()),
    })
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing required fields: {}", msg))
            }
            AuthError::ParseError(msg) => {
                (StatusCode::BAD_REQUEST, format!("Parse error: {}", msg))
            }
            AuthError::Other(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Authentication error: {}", msg))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
