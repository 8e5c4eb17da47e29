//! SQLite-backed application store

use aimclub_common::events::{ChangeKind, ClubEvent, EventBus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ApplicationFilter, ApplicationStore};
use crate::error::{Error, Result};
use crate::model::{
    ApplicationPatch, ApplicationRecord, InterviewDetails, LogEntry, NewApplication,
    PersonalInfo, Status,
};

const SELECT_COLUMNS: &str = "id, applicant_id, tracking_id, name, roll_number, email, contact, \
     year_of_study, role, answers, status, viewed, submitted_at, interview_details, logs";

/// Application store over the `applications` table
#[derive(Clone)]
pub struct SqliteApplicationStore {
    pool: SqlitePool,
    events: EventBus,
}

impl SqliteApplicationStore {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self { pool, events }
    }

    fn publish(&self, change: ChangeKind, record: &ApplicationRecord) {
        self.events.emit_lossy(ClubEvent::ApplicationChanged {
            change,
            application_id: record.id,
            applicant_id: record.applicant_id.clone(),
            status: record.status.to_string(),
            timestamp: Utc::now(),
        });
    }
}

fn row_to_record(row: &SqliteRow) -> Result<ApplicationRecord> {
    let id: String = row.try_get("id")?;
    let year: String = row.try_get("year_of_study")?;
    let status: String = row.try_get("status")?;
    let answers: String = row.try_get("answers")?;
    let interview: Option<String> = row.try_get("interview_details")?;
    let logs: String = row.try_get("logs")?;

    Ok(ApplicationRecord {
        id: Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("Bad record id {}: {}", id, e)))?,
        applicant_id: row.try_get("applicant_id")?,
        tracking_id: row.try_get("tracking_id")?,
        personal_info: PersonalInfo {
            name: row.try_get("name")?,
            roll_number: row.try_get("roll_number")?,
            email: row.try_get("email")?,
            contact: row.try_get("contact")?,
            year_of_study: year.parse()?,
        },
        role: row.try_get("role")?,
        answers: serde_json::from_str::<BTreeMap<String, String>>(&answers)?,
        status: status.parse()?,
        viewed: row.try_get::<i64, _>("viewed")? != 0,
        submitted_at: row.try_get::<DateTime<Utc>, _>("submitted_at")?,
        interview_details: interview
            .map(|json| serde_json::from_str::<InterviewDetails>(&json))
            .transpose()?,
        logs: serde_json::from_str::<Vec<LogEntry>>(&logs)?,
    })
}

fn map_insert_error(e: sqlx::Error, new: &NewApplication) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(format!(
            "Applicant id {} or its tracking token is already in use",
            new.applicant_id
        )),
        _ => Error::Database(e),
    }
}

#[async_trait]
impl ApplicationStore for SqliteApplicationStore {
    async fn create(&self, new: NewApplication) -> Result<ApplicationRecord> {
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            applicant_id: new.applicant_id.clone(),
            tracking_id: new.tracking_id.clone(),
            personal_info: new.personal_info.clone(),
            role: new.role.clone(),
            answers: new.answers.clone(),
            status: Status::Pending,
            viewed: false,
            submitted_at: Utc::now(),
            interview_details: None,
            logs: Vec::new(),
        };

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, applicant_id, tracking_id, name, roll_number, email, contact,
                year_of_study, role, answers, status, viewed, submitted_at,
                interview_details, logs
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, '[]')
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.applicant_id)
        .bind(&record.tracking_id)
        .bind(&record.personal_info.name)
        .bind(&record.personal_info.roll_number)
        .bind(&record.personal_info.email)
        .bind(&record.personal_info.contact)
        .bind(record.personal_info.year_of_study.as_str())
        .bind(&record.role)
        .bind(serde_json::to_string(&record.answers)?)
        .bind(record.status.as_str())
        .bind(0i64)
        .bind(record.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &new))?;

        info!(applicant_id = %record.applicant_id, role = %record.role, "Application stored");
        self.publish(ChangeKind::Created, &record);
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> Result<ApplicationRecord> {
        // Take the write lock before reading so concurrent updates queue on busy_timeout
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let row = sqlx::query(&format!("SELECT {} FROM applications WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {}", id)))?;

        let mut record = row_to_record(&row)?;
        patch.apply_to(&mut record);

        let interview_json = record
            .interview_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            UPDATE applications
            SET status = ?, viewed = ?, interview_details = ?, logs = ?
            WHERE id = ?
            "#,
        )
        .bind(record.status.as_str())
        .bind(record.viewed as i64)
        .bind(interview_json)
        .bind(serde_json::to_string(&record.logs)?)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(applicant_id = %record.applicant_id, status = %record.status, "Application updated");
        self.publish(ChangeKind::Updated, &record);
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let record = self.get(id).await?;

        let result = sqlx::query("DELETE FROM applications WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Application {}", id)));
        }

        info!(applicant_id = %record.applicant_id, "Application deleted");
        self.publish(ChangeKind::Deleted, &record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationRecord> {
        let row = sqlx::query(&format!("SELECT {} FROM applications WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {}", id)))?;

        row_to_record(&row)
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<ApplicationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM applications WHERE tracking_id = ?",
            SELECT_COLUMNS
        ))
        .bind(tracking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>> {
        let mut sql = format!("SELECT {} FROM applications WHERE 1 = 1", SELECT_COLUMNS);
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.role.is_some() {
            sql.push_str(" AND role = ?");
        }
        sql.push_str(" ORDER BY submitted_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(role) = &filter.role {
            query = query.bind(role.clone());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}
