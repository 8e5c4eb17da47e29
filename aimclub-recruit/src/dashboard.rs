//! Admin dashboard queries over listed applications

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{ApplicationRecord, Status};

/// Headline counts for the admin overview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total: usize,
    /// Submitted on `today` (UTC)
    pub today: usize,
    pub pending: usize,
    pub shortlisted: usize,
    pub interviews: usize,
    pub rejected: usize,
    pub unviewed: usize,
}

pub fn metrics(records: &[ApplicationRecord], today: NaiveDate) -> DashboardMetrics {
    let count = |status: Status| records.iter().filter(|r| r.status == status).count();

    DashboardMetrics {
        total: records.len(),
        today: records
            .iter()
            .filter(|r| r.submitted_at.date_naive() == today)
            .count(),
        pending: count(Status::Pending),
        shortlisted: count(Status::Shortlisted),
        interviews: count(Status::InterviewScheduled),
        rejected: count(Status::Rejected),
        unviewed: records.iter().filter(|r| !r.viewed).count(),
    }
}

/// Case-insensitive match on name or applicant id, optionally narrowed by status
pub fn search<'a>(
    records: &'a [ApplicationRecord],
    text: &str,
    status: Option<Status>,
) -> Vec<&'a ApplicationRecord> {
    let needle = text.trim().to_lowercase();
    records
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .filter(|r| {
            needle.is_empty()
                || r.personal_info.name.to_lowercase().contains(&needle)
                || r.applicant_id.to_lowercase().contains(&needle)
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub const CSV_HEADER: &str = "ID,Name,Email,Role,Status";

/// One row per record: applicant id, name, email, role, status
pub fn export_csv<'a>(records: impl IntoIterator<Item = &'a ApplicationRecord>) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    for r in records {
        let row = [
            r.applicant_id.as_str(),
            r.personal_info.name.as_str(),
            r.personal_info.email.as_str(),
            r.role.as_str(),
            r.status.as_str(),
        ]
        .map(csv_field)
        .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

/// Interviews scheduled on `date`, ordered by time then applicant id
pub fn briefings_for<'a>(records: &'a [ApplicationRecord], date: NaiveDate) -> Vec<&'a ApplicationRecord> {
    let day = date.format("%Y-%m-%d").to_string();
    let mut briefings: Vec<&ApplicationRecord> = records
        .iter()
        .filter(|r| r.status == Status::InterviewScheduled)
        .filter(|r| r.interview_details.as_ref().is_some_and(|d| d.date == day))
        .collect();
    briefings.sort_by(|a, b| interview_sort_key(a).cmp(&interview_sort_key(b)));
    briefings
}

fn interview_sort_key(record: &ApplicationRecord) -> (Option<chrono::NaiveTime>, String, &str) {
    let time = record
        .interview_details
        .as_ref()
        .map(|d| d.time.trim().to_string())
        .unwrap_or_default();
    (parse_time(&time), time, record.applicant_id.as_str())
}

/// Accepts `14:30`, `2:30 PM` and `02:30PM`
fn parse_time(text: &str) -> Option<chrono::NaiveTime> {
    ["%H:%M", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| chrono::NaiveTime::parse_from_str(&text.to_uppercase(), fmt).ok())
}

/// Scheduled interviews grouped by date text
pub fn interview_calendar(records: &[ApplicationRecord]) -> BTreeMap<String, Vec<&ApplicationRecord>> {
    let mut calendar: BTreeMap<String, Vec<&ApplicationRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.status == Status::InterviewScheduled) {
        if let Some(details) = &record.interview_details {
            calendar.entry(details.date.clone()).or_default().push(record);
        }
    }
    for day in calendar.values_mut() {
        day.sort_by(|a, b| interview_sort_key(a).cmp(&interview_sort_key(b)));
    }
    calendar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InterviewDetails, PersonalInfo};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record(applicant_id: &str, name: &str, status: Status) -> ApplicationRecord {
        ApplicationRecord {
            id: Uuid::new_v4(),
            applicant_id: applicant_id.into(),
            tracking_id: format!("track_{}", applicant_id),
            personal_info: PersonalInfo {
                name: name.into(),
                email: format!("{}@college.edu", name.to_lowercase()),
                ..Default::default()
            },
            role: "Secretary".into(),
            answers: Default::default(),
            status,
            viewed: false,
            submitted_at: Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            interview_details: None,
            logs: Vec::new(),
        }
    }

    fn scheduled(applicant_id: &str, date: &str, time: &str) -> ApplicationRecord {
        let mut r = record(applicant_id, "Cand", Status::InterviewScheduled);
        r.interview_details = Some(InterviewDetails {
            date: date.into(),
            time: time.into(),
            link: "https://meet.example/x".into(),
        });
        r
    }

    #[test]
    fn test_metrics() {
        let mut viewed = record("AIM-2", "Ben", Status::Rejected);
        viewed.viewed = true;
        let records = vec![
            record("AIM-1", "Asha", Status::Pending),
            viewed,
            scheduled("AIM-3", "2026-03-14", "10:00 AM"),
        ];

        let m = metrics(&records, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(m.total, 3);
        assert_eq!(m.today, 3);
        assert_eq!(m.pending, 1);
        assert_eq!(m.rejected, 1);
        assert_eq!(m.interviews, 1);
        assert_eq!(m.unviewed, 2);

        let later = metrics(&records, NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert_eq!(later.today, 0);
    }

    #[test]
    fn test_search() {
        let records = vec![
            record("AIM-A1", "Asha Rao", Status::Pending),
            record("AIM-B2", "Ben Thomas", Status::Rejected),
        ];
        assert_eq!(search(&records, "asha", None).len(), 1);
        assert_eq!(search(&records, "aim-b", None)[0].applicant_id, "AIM-B2");
        assert_eq!(search(&records, "", None).len(), 2);
        assert!(search(&records, "asha", Some(Status::Rejected)).is_empty());
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let records = vec![record("AIM-1", "Rao, Asha", Status::InterviewScheduled)];
        let csv = export_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "AIM-1,\"Rao, Asha\",\"rao, asha@college.edu\",Secretary,Interview Scheduled"
        );
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_briefings_ordered_by_time() {
        let records = vec![
            scheduled("AIM-1", "2026-03-14", "2:30 PM"),
            scheduled("AIM-2", "2026-03-14", "09:15"),
            scheduled("AIM-3", "2026-03-15", "08:00"),
            record("AIM-4", "Dee", Status::Pending),
        ];
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let ids: Vec<&str> = briefings_for(&records, day)
            .into_iter()
            .map(|r| r.applicant_id.as_str())
            .collect();
        assert_eq!(ids, vec!["AIM-2", "AIM-1"]);
    }

    #[test]
    fn test_calendar_groups_by_date() {
        let mut moved_on = scheduled("AIM-9", "2026-03-14", "11:00");
        moved_on.status = Status::Selected;
        let records = vec![
            scheduled("AIM-1", "2026-03-15", "10:00"),
            scheduled("AIM-2", "2026-03-14", "10:00"),
            moved_on,
        ];
        let calendar = interview_calendar(&records);
        let days: Vec<&String> = calendar.keys().collect();
        assert_eq!(days, vec!["2026-03-14", "2026-03-15"]);
        assert_eq!(calendar["2026-03-14"].len(), 1);
    }
}
