//! Tracking resolver
//!
//! Read-only projection of an application for the holder of its tracking
//! token. The token is matched exactly; anything else resolves to the same
//! generic not-found outcome.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{ApplicationRecord, InterviewDetails, Status};
use crate::store::ApplicationStore;

pub const TRACKING_NOT_FOUND: &str = "Application not found. Please check your tracking link.";

/// Steps on the applicant-facing timeline
pub const TOTAL_STEPS: u8 = 4;

/// How a status is shown on the tracking page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub step: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    /// Waitlisted sits beside Interview Scheduled rather than after it
    pub side_branch: bool,
}

pub fn status_display(status: Status) -> StatusDisplay {
    let (step, title, description, color, side_branch) = match status {
        Status::Pending => (
            1,
            "Application Received",
            "We've received your application and it's in our queue.",
            "yellow",
            false,
        ),
        Status::Shortlisted => (
            2,
            "Under Review",
            "Our committee is carefully reviewing your profile.",
            "blue",
            false,
        ),
        Status::InterviewScheduled => (
            3,
            "Interview Scheduled",
            "Your interview has been scheduled. Check your email for details.",
            "purple",
            false,
        ),
        Status::Waitlisted => (
            3,
            "Waitlisted",
            "Your application has been placed on the waitlist for this cycle.",
            "orange",
            true,
        ),
        Status::Selected => (
            4,
            "Decision Made: Selected",
            "Congratulations! You've been selected to join the A.I.M. Club.",
            "green",
            false,
        ),
        Status::Rejected => (
            4,
            "Decision Made",
            "Thank you for your interest. The position has been filled.",
            "red",
            false,
        ),
    };

    StatusDisplay {
        step,
        title,
        description,
        color,
        side_branch,
    }
}

/// One timeline node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub step: u8,
    pub title: &'static str,
    pub reached: bool,
    pub current: bool,
}

fn timeline(current: StatusDisplay) -> Vec<TimelineStep> {
    let titles = ["Application Received", "Under Review", "Interview", "Final Decision"];
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let step = i as u8 + 1;
            TimelineStep {
                step,
                title: if step == current.step { current.title } else { title },
                reached: step <= current.step,
                current: step == current.step,
            }
        })
        .collect()
}

/// What an applicant sees for their token
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub name: String,
    pub applicant_id: String,
    pub role: String,
    pub status: Status,
    pub display: StatusDisplay,
    pub total_steps: u8,
    pub timeline: Vec<TimelineStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_details: Option<InterviewDetails>,
}

impl TrackingView {
    pub fn from_record(record: &ApplicationRecord) -> Self {
        let display = status_display(record.status);
        let interview_details = if record.status == Status::InterviewScheduled {
            record.interview_details.clone()
        } else {
            None
        };

        Self {
            name: record.personal_info.name.clone(),
            applicant_id: record.applicant_id.clone(),
            role: record.role.clone(),
            status: record.status,
            display,
            total_steps: TOTAL_STEPS,
            timeline: timeline(display),
            interview_details,
        }
    }
}

/// Token lookup over the store
#[derive(Clone)]
pub struct TrackingResolver {
    store: Arc<dyn ApplicationStore>,
}

impl TrackingResolver {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, token: &str) -> Result<TrackingView> {
        if token.is_empty() {
            return Err(Error::NotFound(TRACKING_NOT_FOUND.into()));
        }
        match self.store.find_by_tracking_id(token).await? {
            Some(record) => Ok(TrackingView::from_record(&record)),
            None => Err(Error::NotFound(TRACKING_NOT_FOUND.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PersonalInfo, YearOfStudy};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(status: Status) -> ApplicationRecord {
        ApplicationRecord {
            id: Uuid::new_v4(),
            applicant_id: "AIM-1".into(),
            tracking_id: "track_abc123".into(),
            personal_info: PersonalInfo {
                name: "Asha Rao".into(),
                year_of_study: YearOfStudy::Fourth,
                ..Default::default()
            },
            role: "Secretary".into(),
            answers: BTreeMap::new(),
            status,
            viewed: true,
            submitted_at: Utc::now(),
            interview_details: Some(InterviewDetails {
                date: "2026-03-14".into(),
                time: "10:00 AM".into(),
                link: "https://meet.example/abc".into(),
            }),
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_steps() {
        assert_eq!(status_display(Status::Pending).step, 1);
        assert_eq!(status_display(Status::Shortlisted).step, 2);
        assert_eq!(status_display(Status::InterviewScheduled).step, 3);
        assert_eq!(status_display(Status::Waitlisted).step, 3);
        assert_eq!(status_display(Status::Selected).step, 4);
        assert_eq!(status_display(Status::Rejected).step, 4);

        assert!(status_display(Status::Waitlisted).side_branch);
        assert!(Status::ALL
            .iter()
            .filter(|s| **s != Status::Waitlisted)
            .all(|s| !status_display(*s).side_branch));
    }

    #[test]
    fn test_interview_details_only_while_scheduled() {
        let scheduled = TrackingView::from_record(&record(Status::InterviewScheduled));
        assert!(scheduled.interview_details.is_some());

        let moved_on = TrackingView::from_record(&record(Status::Selected));
        assert!(moved_on.interview_details.is_none());
        assert_eq!(moved_on.display.title, "Decision Made: Selected");
    }

    #[test]
    fn test_timeline_marks_progress() {
        let view = TrackingView::from_record(&record(Status::Waitlisted));
        assert_eq!(view.timeline.len(), TOTAL_STEPS as usize);
        assert!(view.timeline[2].current);
        assert_eq!(view.timeline[2].title, "Waitlisted");
        assert!(view.timeline[1].reached);
        assert!(!view.timeline[3].reached);
    }
}
