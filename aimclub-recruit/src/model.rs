//! Recruitment data model
//!
//! Status and year-of-study values serialize to the exact wire vocabulary
//! used by the persisted `applications` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Application status
///
/// A free digraph over six states; a new record always starts at `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Shortlisted,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    Selected,
    Waitlisted,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Pending,
        Status::Shortlisted,
        Status::InterviewScheduled,
        Status::Selected,
        Status::Waitlisted,
        Status::Rejected,
    ];

    /// Wire-exact, case-sensitive name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Shortlisted => "Shortlisted",
            Status::InterviewScheduled => "Interview Scheduled",
            Status::Selected => "Selected",
            Status::Waitlisted => "Waitlisted",
            Status::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown application status '{}'", s)))
    }
}

/// Year of study, serialized as "1".."4"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearOfStudy {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
}

impl YearOfStudy {
    pub const ALL: [YearOfStudy; 4] = [
        YearOfStudy::First,
        YearOfStudy::Second,
        YearOfStudy::Third,
        YearOfStudy::Fourth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            YearOfStudy::First => "1",
            YearOfStudy::Second => "2",
            YearOfStudy::Third => "3",
            YearOfStudy::Fourth => "4",
        }
    }
}

impl fmt::Display for YearOfStudy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YearOfStudy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(YearOfStudy::First),
            "2" => Ok(YearOfStudy::Second),
            "3" => Ok(YearOfStudy::Third),
            "4" => Ok(YearOfStudy::Fourth),
            other => Err(Error::Validation(format!(
                "Year of study must be 1, 2, 3 or 4 (got '{}')",
                other
            ))),
        }
    }
}

/// Applicant identity and contact details; immutable after submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub contact: String,
    pub year_of_study: YearOfStudy,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            roll_number: String::new(),
            email: String::new(),
            contact: String::new(),
            year_of_study: YearOfStudy::First,
        }
    }
}

/// Interview schedule sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewDetails {
    pub date: String,
    pub time: String,
    pub link: String,
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: DateTime<Utc>,
    pub action: String,
    pub note: String,
}

impl LogEntry {
    pub fn now(action: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            date: Utc::now(),
            action: action.into(),
            note: note.into(),
        }
    }
}

/// Answer key for the question at zero-based `index` ("Q1", "Q2", ...)
pub fn answer_key(index: usize) -> String {
    format!("Q{}", index + 1)
}

/// A stored application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub applicant_id: String,
    pub tracking_id: String,
    #[serde(flatten)]
    pub personal_info: PersonalInfo,
    pub role: String,
    pub answers: BTreeMap<String, String>,
    pub status: Status,
    pub viewed: bool,
    pub submitted_at: DateTime<Utc>,
    pub interview_details: Option<InterviewDetails>,
    pub logs: Vec<LogEntry>,
}

/// An application ready for insertion; the store assigns `id` and `submitted_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub applicant_id: String,
    pub tracking_id: String,
    pub personal_info: PersonalInfo,
    pub role: String,
    pub answers: BTreeMap<String, String>,
}

/// Partial update applied by the store
///
/// `append_log` is appended after existing entries; it never replaces them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationPatch {
    pub status: Option<Status>,
    pub interview_details: Option<InterviewDetails>,
    pub viewed: Option<bool>,
    pub append_log: Option<LogEntry>,
}

impl ApplicationPatch {
    /// Apply the patch to a record in place
    pub fn apply_to(self, record: &mut ApplicationRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(details) = self.interview_details {
            record.interview_details = Some(details);
        }
        if let Some(viewed) = self.viewed {
            record.viewed = viewed;
        }
        if let Some(entry) = self.append_log {
            record.logs.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert_eq!(Status::InterviewScheduled.to_string(), "Interview Scheduled");
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert!("pending".parse::<Status>().is_err());
        assert!("Interview scheduled".parse::<Status>().is_err());
        assert!("InterviewScheduled".parse::<Status>().is_err());
    }

    #[test]
    fn test_year_of_study_wire_names() {
        assert_eq!(serde_json::to_string(&YearOfStudy::Third).unwrap(), "\"3\"");
        assert_eq!("4".parse::<YearOfStudy>().unwrap(), YearOfStudy::Fourth);
        assert!("5".parse::<YearOfStudy>().is_err());
    }

    #[test]
    fn test_answer_key_is_one_based() {
        assert_eq!(answer_key(0), "Q1");
        assert_eq!(answer_key(2), "Q3");
    }

    #[test]
    fn test_patch_appends_log_and_keeps_interview_details() {
        let mut record = ApplicationRecord {
            id: Uuid::new_v4(),
            applicant_id: "AIM-1".into(),
            tracking_id: "track_1".into(),
            personal_info: PersonalInfo::default(),
            role: "Secretary".into(),
            answers: BTreeMap::new(),
            status: Status::InterviewScheduled,
            viewed: false,
            submitted_at: Utc::now(),
            interview_details: Some(InterviewDetails {
                date: "2026-03-14".into(),
                time: "10:00 AM".into(),
                link: "https://meet.example/abc".into(),
            }),
            logs: vec![LogEntry::now("Interview Scheduled", "first")],
        };

        ApplicationPatch {
            status: Some(Status::Waitlisted),
            viewed: Some(true),
            append_log: Some(LogEntry::now("Status: Waitlisted", "Updated by admin")),
            ..Default::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.status, Status::Waitlisted);
        assert!(record.viewed);
        assert_eq!(record.logs.len(), 2);
        assert_eq!(record.logs[0].note, "first");
        assert!(record.interview_details.is_some(), "schedule persists across status changes");
    }
}
