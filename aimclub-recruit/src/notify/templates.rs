//! Message templates

use aimclub_common::time::parse_date;

use super::OutboundMessage;
use crate::model::{ApplicationRecord, InterviewDetails, PersonalInfo, Status};

const COMMITTEE_SIGNATURE: &str = "Best Regards,\nThe A.I.M. Club Committee";

/// Applicant-facing fields shared by the confirmation template
pub struct ConfirmationContext<'a> {
    pub applicant_id: &'a str,
    pub personal_info: &'a PersonalInfo,
    pub role: &'a str,
    pub tracking_link: &'a str,
}

/// Submission confirmation, copied to the applicant
pub fn application_confirmation(ctx: &ConfirmationContext<'_>, admin_email: &str) -> OutboundMessage {
    let info = ctx.personal_info;
    let body = format!(
        "Dear {name},\n\n\
         Thank you for registering for the A.I.M. Club! We have successfully received your \
         application for the {role} position.\n\n\
         VETTING WINDOW:\n\
         Your application has been logged. The response will be validated within 3-5 working \
         days by our committee.\n\n\
         SUMMARY OF YOUR SUBMISSION:\n\
         - Applicant ID: {applicant_id}\n\
         - Role Applied: {role}\n\
         - Roll Number: {roll}\n\
         - Year of Study: {year} Year\n\n\
         TRACKING:\n\
         You can track your application status in real-time from the link below:\n\
         {link}\n\n\
         We appreciate your interest in joining the A.I.M. Club. You will receive further \
         updates as we process your application.\n\n\
         {signature}",
        name = info.name,
        role = ctx.role,
        applicant_id = ctx.applicant_id,
        roll = info.roll_number,
        year = info.year_of_study,
        link = ctx.tracking_link,
        signature = COMMITTEE_SIGNATURE,
    );

    OutboundMessage {
        sender_name: info.name.clone(),
        to: vec![admin_email.to_string()],
        cc: Some(info.email.clone()),
        reply_to: Some(info.email.clone()),
        subject: format!("A.I.M. Club | Thank You for Registering - {}", ctx.role),
        body,
    }
}

/// Paragraph explaining a status; generic for statuses without their own text
pub fn status_paragraph(status: Status) -> &'static str {
    match status {
        Status::Shortlisted => {
            "Your profile has passed the initial vetting process. Our committee is now \
             reviewing your responses for final interview scheduling."
        }
        Status::Waitlisted => {
            "You have been placed on our waitlist. While we cannot offer an immediate slot, \
             your profile remains active for future openings this cycle."
        }
        Status::Selected => {
            "Congratulations and welcome to the A.I.M. Club. We will reach out shortly with \
             onboarding details."
        }
        Status::Rejected => {
            "Our selection cycle for this role has concluded. We appreciate your interest and \
             encourage you to apply again in future cycles."
        }
        _ => "Your application status has been updated in our database.",
    }
}

/// Status change notice, copied to the applicant
pub fn status_update(record: &ApplicationRecord, tracking_link: &str, admin_email: &str) -> OutboundMessage {
    let body = format!(
        "Dear {name},\n\n\
         Application Status Update: {status}\n\n\
         {paragraph}\n\n\
         You can review your application and its real-time status at your tracking link:\n\
         {link}\n\n\
         {signature}",
        name = record.personal_info.name,
        status = record.status,
        paragraph = status_paragraph(record.status),
        link = tracking_link,
        signature = COMMITTEE_SIGNATURE,
    );

    OutboundMessage {
        sender_name: record.personal_info.name.clone(),
        to: vec![admin_email.to_string()],
        cc: Some(record.personal_info.email.clone()),
        reply_to: Some(admin_email.to_string()),
        subject: format!("A.I.M. Club | Status Update - {}", record.status),
        body,
    }
}

/// `Sat Mar 14 2026` for ISO dates, otherwise the text as entered
pub fn display_date(date: &str) -> String {
    match parse_date(date) {
        Some(d) => d.format("%a %b %d %Y").to_string(),
        None => date.to_string(),
    }
}

/// Interview invitation, copied to the applicant
pub fn interview_scheduled(
    record: &ApplicationRecord,
    details: &InterviewDetails,
    admin_email: &str,
) -> OutboundMessage {
    let body = format!(
        "Dear {name},\n\n\
         Your interview for the {role} position at the A.I.M. Club has been scheduled.\n\n\
         DATE: {date}\n\
         TIME: {time}\n\
         MEETING LINK: {link}\n\n\
         Please be prepared to discuss your interests and your vision for the role. \
         We look forward to meeting you.\n\n\
         {signature}",
        name = record.personal_info.name,
        role = record.role,
        date = display_date(&details.date),
        time = details.time,
        link = details.link,
        signature = COMMITTEE_SIGNATURE,
    );

    OutboundMessage {
        sender_name: record.personal_info.name.clone(),
        to: vec![admin_email.to_string()],
        cc: Some(record.personal_info.email.clone()),
        reply_to: Some(record.personal_info.email.clone()),
        subject: format!("A.I.M. Club | Interview Scheduled: {}", record.personal_info.name),
        body,
    }
}

/// One-time admin access code, sent to the admin only
pub fn access_code(code: &str, staff_name: &str, admin_email: &str) -> OutboundMessage {
    let body = format!(
        "DELEGATED ACCESS REQUESTED\n\n\
         A staff member identifying as \"{staff}\" is requesting temporary access to the \
         A.I.M. admin console.\n\n\
         AUTHORIZATION CODE: {code}\n\n\
         Provide this code only if you recognize the requester. The code can be used once.\n\n\
         Best Regards,\nA.I.M. Security",
        staff = staff_name,
        code = code,
    );

    OutboundMessage {
        sender_name: "A.I.M. Security".to_string(),
        to: vec![admin_email.to_string()],
        cc: None,
        reply_to: None,
        subject: format!("SECURE ACCESS CODE: {}", code),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::YearOfStudy;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(status: Status) -> ApplicationRecord {
        ApplicationRecord {
            id: Uuid::new_v4(),
            applicant_id: "AIM-7QX2".into(),
            tracking_id: "track_abc123".into(),
            personal_info: PersonalInfo {
                name: "Asha Rao".into(),
                roll_number: "21CS042".into(),
                email: "asha@college.edu".into(),
                contact: "9876543210".into(),
                year_of_study: YearOfStudy::Third,
            },
            role: "Treasurer".into(),
            answers: BTreeMap::new(),
            status,
            viewed: false,
            submitted_at: Utc::now(),
            interview_details: None,
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_confirmation_contents() {
        let rec = record(Status::Pending);
        let msg = application_confirmation(
            &ConfirmationContext {
                applicant_id: &rec.applicant_id,
                personal_info: &rec.personal_info,
                role: &rec.role,
                tracking_link: "https://aimclub.example/?track=track_abc123",
            },
            "admin@aimclub.example",
        );

        assert_eq!(msg.subject, "A.I.M. Club | Thank You for Registering - Treasurer");
        assert_eq!(msg.cc.as_deref(), Some("asha@college.edu"));
        assert!(msg.body.contains("Applicant ID: AIM-7QX2"));
        assert!(msg.body.contains("Year of Study: 3 Year"));
        assert!(msg.body.contains("3-5 working days"));
        assert!(msg.body.contains("?track=track_abc123"));
    }

    #[test]
    fn test_status_paragraphs() {
        assert!(status_paragraph(Status::Shortlisted).contains("initial vetting"));
        assert_eq!(
            status_paragraph(Status::Pending),
            "Your application status has been updated in our database."
        );
        assert_eq!(
            status_paragraph(Status::InterviewScheduled),
            status_paragraph(Status::Pending)
        );

        let msg = status_update(&record(Status::Selected), "link", "admin@aimclub.example");
        assert_eq!(msg.subject, "A.I.M. Club | Status Update - Selected");
        assert!(msg.body.contains(status_paragraph(Status::Selected)));
    }

    #[test]
    fn test_interview_message_dates() {
        assert_eq!(display_date("2026-03-14"), "Sat Mar 14 2026");
        assert_eq!(display_date("next Friday"), "next Friday");

        let details = InterviewDetails {
            date: "2026-03-14".into(),
            time: "10:00 AM".into(),
            link: "https://meet.example/abc".into(),
        };
        let msg = interview_scheduled(&record(Status::InterviewScheduled), &details, "admin@aimclub.example");
        assert_eq!(msg.subject, "A.I.M. Club | Interview Scheduled: Asha Rao");
        assert!(msg.body.contains("DATE: Sat Mar 14 2026"));
        assert!(msg.body.contains("MEETING LINK: https://meet.example/abc"));
    }

    #[test]
    fn test_access_code_message() {
        let msg = access_code("482913", "Ravi", "admin@aimclub.example");
        assert_eq!(msg.subject, "SECURE ACCESS CODE: 482913");
        assert_eq!(msg.to, vec!["admin@aimclub.example".to_string()]);
        assert!(msg.body.contains("\"Ravi\""));
    }
}
