//! Status lifecycle controller
//!
//! Admin-side mutations of an application. Each status change or interview
//! schedule appends exactly one log entry, marks the record viewed and is
//! persisted before the applicant is notified. A failed notification is
//! reported in the result and never undoes the stored change.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{ApplicationPatch, ApplicationRecord, InterviewDetails, LogEntry, Status};
use crate::notify::{templates, NotificationDispatch, NotificationOutcome, NotifyTargets};
use crate::store::ApplicationStore;

pub const STATUS_LOG_NOTE: &str = "Updated by admin";
pub const INTERVIEW_LOG_ACTION: &str = "Interview Scheduled";

/// Log action recorded for a status change
pub fn status_log_action(status: Status) -> String {
    format!("Status: {}", status)
}

/// A stored change and how its notification went
#[derive(Debug, Clone)]
pub struct LifecycleResult {
    pub application: ApplicationRecord,
    pub notification: NotificationOutcome,
}

/// One id a bulk update could not change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub reason: String,
}

/// Aggregate result of a bulk status change
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub updated: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
    /// Updated ids whose notification failed
    pub notification_failures: Vec<Uuid>,
}

impl BulkReport {
    pub fn success_count(&self) -> usize {
        self.updated.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Admin transitions over stored applications
#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn ApplicationStore>,
    notifications: NotificationDispatch,
    targets: NotifyTargets,
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        notifications: NotificationDispatch,
        targets: NotifyTargets,
    ) -> Self {
        Self {
            store,
            notifications,
            targets,
        }
    }

    /// Move an application to `status` and tell the applicant
    pub async fn set_status(&self, id: Uuid, status: Status) -> Result<LifecycleResult> {
        let application = self
            .store
            .update(
                id,
                ApplicationPatch {
                    status: Some(status),
                    viewed: Some(true),
                    append_log: Some(LogEntry::now(status_log_action(status), STATUS_LOG_NOTE)),
                    ..Default::default()
                },
            )
            .await?;

        info!(applicant_id = %application.applicant_id, status = %status, "Status updated");

        let tracking_link = self.targets.tracking_link(&application.tracking_id);
        let message = templates::status_update(&application, &tracking_link, &self.targets.admin_email);
        let notification = self.notifications.deliver(&message).await;

        Ok(LifecycleResult {
            application,
            notification,
        })
    }

    /// Schedule (or reschedule) an interview
    ///
    /// All three fields must be non-empty; nothing is stored otherwise.
    pub async fn schedule_interview(&self, id: Uuid, details: InterviewDetails) -> Result<LifecycleResult> {
        let details = InterviewDetails {
            date: details.date.trim().to_string(),
            time: details.time.trim().to_string(),
            link: details.link.trim().to_string(),
        };
        for (field, value) in [("date", &details.date), ("time", &details.time), ("link", &details.link)] {
            if value.is_empty() {
                return Err(Error::Validation(format!("Interview {} is required", field)));
            }
        }

        let note = format!("Scheduled for {} at {}", details.date, details.time);
        let application = self
            .store
            .update(
                id,
                ApplicationPatch {
                    status: Some(Status::InterviewScheduled),
                    interview_details: Some(details.clone()),
                    viewed: Some(true),
                    append_log: Some(LogEntry::now(INTERVIEW_LOG_ACTION, note)),
                },
            )
            .await?;

        info!(
            applicant_id = %application.applicant_id,
            date = %details.date,
            time = %details.time,
            "Interview scheduled"
        );

        let message = templates::interview_scheduled(&application, &details, &self.targets.admin_email);
        let notification = self.notifications.deliver(&message).await;

        Ok(LifecycleResult {
            application,
            notification,
        })
    }

    /// Apply `status` to every id independently
    ///
    /// A missing or failing id is counted and the rest still go through.
    pub async fn bulk_set_status(&self, ids: &[Uuid], status: Status) -> BulkReport {
        let results = join_all(ids.iter().map(|&id| async move { (id, self.set_status(id, status).await) })).await;

        let mut report = BulkReport::default();
        for (id, result) in results {
            match result {
                Ok(outcome) => {
                    if !outcome.notification.is_delivered() {
                        report.notification_failures.push(id);
                    }
                    report.updated.push(id);
                }
                Err(e) => {
                    warn!(%id, status = %status, error = %e, "Bulk status update skipped record");
                    report.failed.push(BulkFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            status = %status,
            updated = report.success_count(),
            failed = report.failure_count(),
            "Bulk status update finished"
        );
        report
    }

    /// Flag a record as seen without logging
    pub async fn mark_viewed(&self, id: Uuid) -> Result<ApplicationRecord> {
        self.store
            .update(
                id,
                ApplicationPatch {
                    viewed: Some(true),
                    ..Default::default()
                },
            )
            .await
    }

    /// Remove a record permanently
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        info!(%id, "Application removed by admin");
        Ok(())
    }
}
