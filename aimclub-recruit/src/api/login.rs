//! Admin login endpoints
//!
//! Both paths end with the API shared secret, which the admin console then
//! uses to sign protected requests.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub master_key: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessCodeRequest {
    pub staff_name: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub shared_secret: i64,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let shared_secret = state.gate.login_with_master_key(&request.master_key)?;
    Ok(Json(SessionResponse { shared_secret }))
}

/// POST /api/admin/otp
pub async fn request_access_code(
    State(state): State<AppState>,
    Json(request): Json<AccessCodeRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    state.gate.request_access_code(&request.staff_name).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Access code sent to the admin inbox" })),
    ))
}

/// POST /api/admin/otp/verify
pub async fn verify_access_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>> {
    let shared_secret = state.gate.verify_access_code(&request.code).await?;
    Ok(Json(SessionResponse { shared_secret }))
}
