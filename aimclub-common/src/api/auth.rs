//! Admin API authentication via timestamp and hash validation
//!
//! # Scheme
//!
//! - Every protected request carries `timestamp` (Unix epoch ms) and `hash` (SHA-256 hex)
//! - Timestamp must be within 1000ms past and 1ms future of server time
//! - Hash is computed over canonical JSON (hash field zeroed) with the shared secret appended
//! - The hashed JSON also carries the request `method` and `path` (target minus auth pairs)
//! - Shared secret lives in the `settings` table; the value 0 disables checking
//!
//! Admins obtain the shared secret through the master-key or one-time-code gate.
//! This module holds only pure functions and database operations; the axum
//! middleware lives in the service crate.

use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Settings key holding the API shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Placeholder substituted for the hash field before hashing
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Accepted clock skew, milliseconds in the past
const MAX_PAST_MS: i64 = 1000;
/// Accepted clock skew, milliseconds in the future
const MAX_FUTURE_MS: i64 = 1;

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    #[error("Missing timestamp field")]
    MissingTimestamp,

    #[error("Missing hash field")]
    MissingHash,

    /// Database error loading shared secret
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

// ========================================
// Shared Secret Management
// ========================================

/// Load shared secret from database settings, creating it on first use
#[cfg(feature = "sqlx")]
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(SHARED_SECRET_KEY)
        .fetch_optional(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
#[cfg(feature = "sqlx")]
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let secret = generate_shared_secret();

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Random non-zero i64 (zero would disable auth)
pub fn generate_shared_secret() -> i64 {
    let mut rng = rand::thread_rng();
    loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    }
}

/// Six-digit one-time access code (100000..=999999)
pub fn generate_access_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Compare secrets without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ========================================
// Timestamp Validation
// ========================================

/// Validate a request timestamp against the current clock
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, crate::time::now_millis())
}

/// Validate a request timestamp against an explicit server time
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

// ========================================
// Hash Calculation and Validation
// ========================================

/// Calculate the request hash
///
/// 1. Replace hash field with 64 zeros
/// 2. Canonical JSON (sorted keys, no whitespace)
/// 3. Append shared secret as decimal string
/// 4. SHA-256, lowercase hex
///
/// # Examples
///
/// ```
/// use aimclub_common::api::auth::calculate_hash;
/// use serde_json::json;
///
/// let body = json!({"status": "Selected", "timestamp": 1730000000000i64, "hash": ""});
/// assert_eq!(calculate_hash(&body, 42).len(), 64);
/// ```
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let to_hash = format!("{}{}", to_canonical_json(&value), shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Request target with the `timestamp` and `hash` query pairs removed
///
/// Other query pairs keep their order and raw encoding.
pub fn signing_target(path: &str, query: Option<&str>) -> String {
    let kept: Vec<&str> = query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            key != "timestamp" && key != "hash"
        })
        .collect();

    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}

/// The value a request hash covers
///
/// The signed fields (query auth pair or JSON body) plus the request method and
/// target, so a signature is only good for the request it was made for.
pub fn request_signing_value(mut fields: Value, method: &str, target: &str) -> Value {
    if let Some(obj) = fields.as_object_mut() {
        obj.insert("method".to_string(), Value::String(method.to_ascii_uppercase()));
        obj.insert("path".to_string(), Value::String(target.to_string()));
    }
    fields
}

/// Stamp a JSON body with the current timestamp and its hash for one request
///
/// For GET and DELETE send `json!({})` and move the returned `timestamp` and
/// `hash` into the query string. `target` is the path plus any other query.
/// Client-side counterpart of the middleware check; used by tests and tools.
pub fn sign_request(mut body: Value, method: &str, target: &str, shared_secret: i64) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("timestamp".to_string(), Value::from(crate::time::now_millis()));
    }
    let hash = calculate_hash(&request_signing_value(body.clone(), method, target), shared_secret);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(hash));
    }
    body
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("\"{}\":{}", k, to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Validate hash matches calculated value
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if !constant_time_eq(provided_hash, &calculated) {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}
