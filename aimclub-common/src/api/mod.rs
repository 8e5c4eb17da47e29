//! Shared HTTP API functionality
//!
//! Pure functions, database operations and shared types for admin API
//! authentication. The service crate wraps these in axum middleware.

pub mod auth;
pub mod types;

#[cfg(feature = "sqlx")]
pub use auth::{initialize_shared_secret, load_shared_secret};
pub use auth::{
    calculate_hash, constant_time_eq, generate_access_code, request_signing_value, sign_request,
    signing_target, validate_hash, validate_timestamp, ApiAuthError,
};
pub use types::{AuthErrorResponse, AuthQuery, AuthRequest};
