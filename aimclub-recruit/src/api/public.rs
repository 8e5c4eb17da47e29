//! Applicant-facing endpoints: role listing, submission, tracking

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::intake::IntakeDraft;
use crate::model::YearOfStudy;
use crate::notify::NotificationReport;
use crate::roles::RoleDefinition;
use crate::tracking::TRACKING_NOT_FOUND;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RolesQuery {
    pub year: Option<String>,
}

/// GET /api/roles?year=N
///
/// Whole catalog, or only the roles open to year `N`.
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<RolesQuery>,
) -> Result<Json<Vec<RoleDefinition>>> {
    let catalog = state.roles.snapshot().await;
    let roles = match query.year.as_deref() {
        Some(year) => {
            let year: YearOfStudy = year.parse()?;
            catalog.eligible_for(year).into_iter().cloned().collect()
        }
        None => catalog.roles().to_vec(),
    };
    Ok(Json(roles))
}

/// Submission acknowledgement
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub applicant_id: String,
    pub tracking_id: String,
    pub tracking_link: String,
    pub notification: NotificationReport,
    pub message: String,
}

/// POST /api/applications
///
/// Runs the complete draft through every wizard step and submits it.
/// Returns 201 even when the confirmation could not be sent.
pub async fn submit_application(
    State(state): State<AppState>,
    Json(draft): Json<IntakeDraft>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    let catalog = state.roles.snapshot().await;
    let receipt = state.intake.submit_draft(catalog, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            applicant_id: receipt.application.applicant_id,
            tracking_id: receipt.application.tracking_id,
            tracking_link: receipt.tracking_link,
            notification: NotificationReport::from(&receipt.notification),
            message: receipt.message,
        }),
    ))
}

/// GET /api/track/:token
pub async fn track_application(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    match state.tracking.resolve(&token).await {
        Ok(view) => Json(view).into_response(),
        Err(Error::NotFound(_)) => {
            debug!("Unknown tracking token requested");
            (StatusCode::NOT_FOUND, Json(json!({ "error": TRACKING_NOT_FOUND }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
