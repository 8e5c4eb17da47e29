//! Protected admin endpoints

use aimclub_common::time::{parse_date, today};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dashboard::{self, DashboardMetrics};
use crate::error::{Error, Result};
use crate::lifecycle::{BulkFailure, BulkReport, LifecycleResult};
use crate::model::{ApplicationRecord, InterviewDetails, Status};
use crate::notify::NotificationReport;
use crate::roles::RoleDefinition;
use crate::store::ApplicationFilter;
use crate::AppState;

/// Search and status filter for listings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    fn status(&self) -> Result<Option<Status>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("All") => Ok(None),
            Some(s) => s.parse::<Status>().map(Some),
        }
    }
}

async fn matching(state: &AppState, query: &ListQuery) -> Result<Vec<ApplicationRecord>> {
    let status = query.status()?;
    let records = state.applications(&ApplicationFilter::default()).await?;
    Ok(dashboard::search(&records, query.search.as_deref().unwrap_or(""), status)
        .into_iter()
        .cloned()
        .collect())
}

/// A stored change with its notification outcome
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub application: ApplicationRecord,
    pub notification: NotificationReport,
}

impl From<LifecycleResult> for LifecycleResponse {
    fn from(result: LifecycleResult) -> Self {
        Self {
            notification: NotificationReport::from(&result.notification),
            application: result.application,
        }
    }
}

/// GET /api/admin/applications?search=&status=
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationRecord>>> {
    Ok(Json(matching(&state, &query).await?))
}

/// GET /api/admin/applications/:id
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRecord>> {
    Ok(Json(state.application(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /api/admin/applications/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<LifecycleResponse>> {
    let status: Status = request.status.parse()?;
    let result = state.lifecycle.set_status(id, status).await?;
    Ok(Json(result.into()))
}

/// POST /api/admin/applications/:id/interview
pub async fn schedule_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(details): Json<InterviewDetails>,
) -> Result<Json<LifecycleResponse>> {
    let result = state.lifecycle.schedule_interview(id, details).await?;
    Ok(Json(result.into()))
}

/// POST /api/admin/applications/:id/viewed
pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRecord>> {
    Ok(Json(state.lifecycle.mark_viewed(id).await?))
}

/// DELETE /api/admin/applications/:id
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.lifecycle.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub updated: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
    pub notification_failures: Vec<Uuid>,
}

impl From<BulkReport> for BulkStatusResponse {
    fn from(report: BulkReport) -> Self {
        Self {
            success_count: report.success_count(),
            failure_count: report.failure_count(),
            updated: report.updated,
            failed: report.failed,
            notification_failures: report.notification_failures,
        }
    }
}

/// POST /api/admin/applications/bulk-status
pub async fn bulk_set_status(
    State(state): State<AppState>,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>> {
    let status: Status = request.status.parse()?;
    let report = state.lifecycle.bulk_set_status(&request.ids, status).await;
    Ok(Json(report.into()))
}

/// GET /api/admin/applications/export.csv
///
/// Honors the same `search` and `status` filters as the listing.
pub async fn export_applications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let records = matching(&state, &query).await?;
    let csv = dashboard::export_csv(&records);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"AIM_Applications.csv\""),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/admin/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<DashboardMetrics>> {
    let records = state.applications(&ApplicationFilter::default()).await?;
    Ok(Json(dashboard::metrics(&records, today())))
}

#[derive(Debug, Deserialize)]
pub struct BriefingQuery {
    pub date: Option<String>,
}

/// GET /api/admin/briefings?date=YYYY-MM-DD (defaults to today)
pub async fn get_briefings(
    State(state): State<AppState>,
    Query(query): Query<BriefingQuery>,
) -> Result<Response> {
    let date = match query.date.as_deref() {
        Some(text) => parse_date(text)
            .ok_or_else(|| Error::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", text)))?,
        None => today(),
    };

    let records = state
        .applications(&ApplicationFilter::with_status(Status::InterviewScheduled))
        .await?;
    Ok(Json(dashboard::briefings_for(&records, date)).into_response())
}

/// GET /api/admin/calendar
pub async fn get_calendar(State(state): State<AppState>) -> Result<Response> {
    let records = state
        .applications(&ApplicationFilter::with_status(Status::InterviewScheduled))
        .await?;
    Ok(Json(dashboard::interview_calendar(&records)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct RoleQuestionsRequest {
    pub questions: Vec<String>,
}

/// PUT /api/admin/roles/:name/questions
pub async fn update_role_questions(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<RoleQuestionsRequest>,
) -> Result<Json<RoleDefinition>> {
    state.roles.update_role_questions(&name, request.questions).await?;
    let role = state
        .roles
        .snapshot()
        .await
        .get(&name)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("Role '{}'", name)))?;
    Ok(Json(role))
}
