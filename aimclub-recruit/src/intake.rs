//! Application intake wizard
//!
//! Four steps: personal details, role and answers, review, submitted. Each
//! forward move is guarded; moving back keeps everything entered so far.
//! Changing the year of study clears the chosen role and its answers, since
//! role eligibility depends on the year.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::ids::{generate_applicant_id, generate_tracking_token};
use crate::model::{answer_key, ApplicationRecord, NewApplication, PersonalInfo, YearOfStudy};
use crate::notify::templates::{self, ConfirmationContext};
use crate::notify::{NotificationDispatch, NotificationOutcome, NotifyTargets};
use crate::roles::{RoleCatalog, RoleDefinition};
use crate::store::ApplicationStore;

/// Attempts at inserting a submission before a conflict is reported
pub const MAX_SUBMIT_ATTEMPTS: usize = 5;

pub const SUBMITTED_MESSAGE: &str =
    "Application submitted! A tracking link has been sent to your email.";

/// Wizard position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeStep {
    CollectingPersonalInfo,
    ChoosingRoleAndAnswering,
    Reviewing,
    Submitted,
}

/// Everything the applicant has entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeDraft {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub role: Option<String>,
    /// Keyed `Q1`, `Q2`, ...
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

/// `local@domain.tld` with a single `@` and no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let last = domain.len().saturating_sub(1);
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < last)
}

/// Exactly ten ASCII digits
pub fn is_valid_contact(contact: &str) -> bool {
    contact.len() == 10 && contact.bytes().all(|b| b.is_ascii_digit())
}

/// Step 1 guard
pub fn validate_personal_info(info: &PersonalInfo) -> Result<()> {
    if info.name.trim().is_empty() {
        return Err(Error::Validation("Full name is required".into()));
    }
    if info.roll_number.trim().is_empty() {
        return Err(Error::Validation("Roll number is required".into()));
    }
    if !is_valid_email(info.email.trim()) {
        return Err(Error::Validation("Please enter a valid email address.".into()));
    }
    if !is_valid_contact(info.contact.trim()) {
        return Err(Error::Validation("Contact number must be exactly 10 digits".into()));
    }
    Ok(())
}

/// Step 2 guard; returns the chosen role definition
pub fn validate_role_and_answers<'a>(
    catalog: &'a RoleCatalog,
    year: YearOfStudy,
    role: Option<&str>,
    answers: &BTreeMap<String, String>,
) -> Result<&'a RoleDefinition> {
    let name = role
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| Error::Validation("Please select a role".into()))?;
    let definition = catalog
        .get(name)
        .ok_or_else(|| Error::Validation(format!("Unknown role '{}'", name)))?;
    if !definition.is_eligible(year) {
        return Err(Error::Validation(format!(
            "The {} role is not open to year {} students",
            name, year
        )));
    }
    for index in 0..definition.questions.len() {
        let answered = answers
            .get(&answer_key(index))
            .is_some_and(|a| !a.trim().is_empty());
        if !answered {
            return Err(Error::Validation(format!("Please answer question {}", index + 1)));
        }
    }
    Ok(definition)
}

/// Multi-step application form
#[derive(Debug, Clone)]
pub struct IntakeWizard {
    catalog: RoleCatalog,
    step: IntakeStep,
    draft: IntakeDraft,
}

impl IntakeWizard {
    /// Start a wizard against a catalog snapshot
    pub fn new(catalog: RoleCatalog) -> Self {
        Self {
            catalog,
            step: IntakeStep::CollectingPersonalInfo,
            draft: IntakeDraft::default(),
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn draft(&self) -> &IntakeDraft {
        &self.draft
    }

    /// Roles the current year of study may apply for
    pub fn available_roles(&self) -> Vec<&RoleDefinition> {
        self.catalog.eligible_for(self.draft.personal_info.year_of_study)
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.step == IntakeStep::Submitted {
            return Err(Error::Validation("Application has already been submitted".into()));
        }
        Ok(())
    }

    /// Replace the personal details; a different year clears role and answers
    pub fn set_personal_info(&mut self, info: PersonalInfo) -> Result<()> {
        self.ensure_editable()?;
        let year = info.year_of_study;
        self.draft.personal_info = PersonalInfo {
            year_of_study: self.draft.personal_info.year_of_study,
            ..info
        };
        self.set_year_of_study(year)
    }

    pub fn set_year_of_study(&mut self, year: YearOfStudy) -> Result<()> {
        self.ensure_editable()?;
        if self.draft.personal_info.year_of_study != year {
            self.draft.personal_info.year_of_study = year;
            self.draft.role = None;
            self.draft.answers.clear();
        }
        Ok(())
    }

    /// Choose a role; switching to a different role clears the answers
    pub fn select_role(&mut self, role: &str) -> Result<()> {
        self.ensure_editable()?;
        if self.draft.role.as_deref() != Some(role) {
            self.draft.role = Some(role.to_string());
            self.draft.answers.clear();
        }
        Ok(())
    }

    /// Record the answer to the question at zero-based `index`
    pub fn set_answer(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.draft.answers.insert(answer_key(index), text.into());
        Ok(())
    }

    /// Move forward through the current step's guard
    pub fn advance(&mut self) -> Result<IntakeStep> {
        self.step = match self.step {
            IntakeStep::CollectingPersonalInfo => {
                validate_personal_info(&self.draft.personal_info)?;
                IntakeStep::ChoosingRoleAndAnswering
            }
            IntakeStep::ChoosingRoleAndAnswering => {
                self.validate_role_step()?;
                IntakeStep::Reviewing
            }
            IntakeStep::Reviewing => {
                return Err(Error::Validation("Submit the application to continue".into()))
            }
            IntakeStep::Submitted => {
                return Err(Error::Validation("Application has already been submitted".into()))
            }
        };
        Ok(self.step)
    }

    /// Move back one step; entered data is kept
    pub fn back(&mut self) -> IntakeStep {
        self.step = match self.step {
            IntakeStep::CollectingPersonalInfo | IntakeStep::ChoosingRoleAndAnswering => {
                IntakeStep::CollectingPersonalInfo
            }
            IntakeStep::Reviewing => IntakeStep::ChoosingRoleAndAnswering,
            IntakeStep::Submitted => IntakeStep::Submitted,
        };
        self.step
    }

    fn validate_role_step(&self) -> Result<&RoleDefinition> {
        validate_role_and_answers(
            &self.catalog,
            self.draft.personal_info.year_of_study,
            self.draft.role.as_deref(),
            &self.draft.answers,
        )
    }

    /// Build the insertion payload from a reviewed draft
    ///
    /// Text fields are trimmed and only answers to the role's questions are kept.
    fn prepare(&self) -> Result<(PersonalInfo, String, BTreeMap<String, String>)> {
        if self.step != IntakeStep::Reviewing {
            return Err(Error::Validation("Review the application before submitting".into()));
        }
        validate_personal_info(&self.draft.personal_info)?;
        let definition = self.validate_role_step()?;

        let info = &self.draft.personal_info;
        let personal_info = PersonalInfo {
            name: info.name.trim().to_string(),
            roll_number: info.roll_number.trim().to_string(),
            email: info.email.trim().to_string(),
            contact: info.contact.trim().to_string(),
            year_of_study: info.year_of_study,
        };
        let answers = (0..definition.questions.len())
            .filter_map(|i| {
                let key = answer_key(i);
                self.draft.answers.get(&key).map(|a| (key, a.trim().to_string()))
            })
            .collect();

        Ok((personal_info, definition.name.clone(), answers))
    }
}

/// Acknowledgement of a stored submission
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub application: ApplicationRecord,
    pub tracking_link: String,
    pub notification: NotificationOutcome,
    /// Applicant-facing acknowledgement; differs when the confirmation failed
    pub message: String,
}

fn acknowledgement(applicant_id: &str, notification: &NotificationOutcome) -> String {
    if notification.is_delivered() {
        SUBMITTED_MESSAGE.to_string()
    } else {
        format!(
            "Application submitted, but we couldn't send the confirmation email. \
             Please keep your applicant ID ({}) and contact us.",
            applicant_id
        )
    }
}

/// Stores submissions and sends their confirmations
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn ApplicationStore>,
    notifications: NotificationDispatch,
    targets: NotifyTargets,
}

impl IntakeService {
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

    /// Submit a reviewed wizard
    ///
    /// The record is stored first, under freshly generated ids (regenerated on
    /// collision). The confirmation is then attempted; its failure changes the
    /// acknowledgement but never the stored record.
    pub async fn submit(&self, wizard: &mut IntakeWizard) -> Result<SubmissionReceipt> {
        let (personal_info, role, answers) = wizard.prepare()?;

        let mut attempt = 0;
        let application = loop {
            attempt += 1;
            let new = NewApplication {
                applicant_id: generate_applicant_id(),
                tracking_id: generate_tracking_token(),
                personal_info: personal_info.clone(),
                role: role.clone(),
                answers: answers.clone(),
            };
            match self.store.create(new).await {
                Ok(record) => break record,
                Err(Error::Conflict(reason)) if attempt < MAX_SUBMIT_ATTEMPTS => {
                    warn!(attempt, "Identifier collision on submit, retrying: {}", reason);
                }
                Err(e) => return Err(e),
            }
        };
        wizard.step = IntakeStep::Submitted;

        let tracking_link = self.targets.tracking_link(&application.tracking_id);
        let message = templates::application_confirmation(
            &ConfirmationContext {
                applicant_id: &application.applicant_id,
                personal_info: &application.personal_info,
                role: &application.role,
                tracking_link: &tracking_link,
            },
            &self.targets.admin_email,
        );
        let notification = self.notifications.deliver(&message).await;

        info!(
            applicant_id = %application.applicant_id,
            role = %application.role,
            confirmed = notification.is_delivered(),
            "Application submitted"
        );

        Ok(SubmissionReceipt {
            message: acknowledgement(&application.applicant_id, &notification),
            application,
            tracking_link,
            notification,
        })
    }

    /// Drive a fresh wizard through every step with a complete draft, then submit
    pub async fn submit_draft(&self, catalog: RoleCatalog, draft: IntakeDraft) -> Result<SubmissionReceipt> {
        let mut wizard = IntakeWizard::new(catalog);
        wizard.set_personal_info(draft.personal_info)?;
        wizard.advance()?;
        if let Some(role) = draft.role.as_deref() {
            wizard.select_role(role)?;
        }
        for (key, text) in draft.answers {
            wizard.draft.answers.insert(key, text);
        }
        wizard.advance()?;
        self.submit(&mut wizard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_info(year: YearOfStudy) -> PersonalInfo {
        PersonalInfo {
            name: "Asha Rao".into(),
            roll_number: "21CS042".into(),
            email: "a@b.com".into(),
            contact: "9876543210".into(),
            year_of_study: year,
        }
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@dept.college.edu"));
        assert!(!is_valid_email("bad"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_contact_rules() {
        assert!(is_valid_contact("0123456789"));
        assert!(!is_valid_contact("123456789"));
        assert!(!is_valid_contact("12345678901"));
        assert!(!is_valid_contact("12345abcde"));
    }

    #[test]
    fn test_step_one_guard() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard
            .set_personal_info(PersonalInfo { email: "bad".into(), ..valid_info(YearOfStudy::Third) })
            .unwrap();
        let err = wizard.advance().unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
        assert_eq!(wizard.step(), IntakeStep::CollectingPersonalInfo);

        wizard.set_personal_info(valid_info(YearOfStudy::Third)).unwrap();
        assert_eq!(wizard.advance().unwrap(), IntakeStep::ChoosingRoleAndAnswering);
    }

    #[test]
    fn test_step_two_requires_every_answer() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard.set_personal_info(valid_info(YearOfStudy::Third)).unwrap();
        wizard.advance().unwrap();

        assert!(wizard.advance().is_err(), "no role selected");

        wizard.select_role("Treasurer").unwrap();
        wizard.set_answer(0, "Ran the hostel mess budget").unwrap();
        wizard.set_answer(1, "   ").unwrap();
        let err = wizard.advance().unwrap_err();
        assert_eq!(err.to_string(), "Please answer question 2");

        wizard.set_answer(1, "Monthly public ledger").unwrap();
        wizard.set_answer(2, "Tiered sponsor packages").unwrap();
        assert_eq!(wizard.advance().unwrap(), IntakeStep::Reviewing);
    }

    #[test]
    fn test_ineligible_role_rejected() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard.set_personal_info(valid_info(YearOfStudy::Second)).unwrap();
        wizard.advance().unwrap();
        wizard.select_role("President").unwrap();
        for i in 0..3 {
            wizard.set_answer(i, "answer").unwrap();
        }
        assert!(matches!(wizard.advance(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_year_change_clears_role_and_answers() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard.set_personal_info(valid_info(YearOfStudy::Third)).unwrap();
        wizard.advance().unwrap();
        wizard.select_role("Treasurer").unwrap();
        wizard.set_answer(0, "answer").unwrap();

        wizard.back();
        wizard.set_year_of_study(YearOfStudy::First).unwrap();

        assert_eq!(wizard.draft().role, None);
        assert!(wizard.draft().answers.is_empty());
        assert!(wizard.available_roles().is_empty());
    }

    #[test]
    fn test_same_year_keeps_selection() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard.set_personal_info(valid_info(YearOfStudy::Third)).unwrap();
        wizard.select_role("Treasurer").unwrap();
        wizard.set_answer(0, "answer").unwrap();

        wizard
            .set_personal_info(PersonalInfo { name: "Asha R.".into(), ..valid_info(YearOfStudy::Third) })
            .unwrap();
        assert_eq!(wizard.draft().role.as_deref(), Some("Treasurer"));
        assert_eq!(wizard.draft().answers.len(), 1);
    }

    #[test]
    fn test_back_preserves_data() {
        let mut wizard = IntakeWizard::new(RoleCatalog::default_catalog());
        wizard.set_personal_info(valid_info(YearOfStudy::Fourth)).unwrap();
        wizard.advance().unwrap();
        wizard.select_role("Secretary").unwrap();
        for i in 0..3 {
            wizard.set_answer(i, format!("answer {}", i + 1)).unwrap();
        }
        wizard.advance().unwrap();

        assert_eq!(wizard.back(), IntakeStep::ChoosingRoleAndAnswering);
        assert_eq!(wizard.back(), IntakeStep::CollectingPersonalInfo);
        assert_eq!(wizard.back(), IntakeStep::CollectingPersonalInfo);

        assert_eq!(wizard.draft().role.as_deref(), Some("Secretary"));
        assert_eq!(wizard.draft().answers.get("Q3").map(String::as_str), Some("answer 3"));
        assert_eq!(wizard.draft().personal_info.name, "Asha Rao");
    }

    #[test]
    fn test_acknowledgement_differs_on_failure() {
        assert_eq!(acknowledgement("AIM-1", &NotificationOutcome::Delivered), SUBMITTED_MESSAGE);
        let degraded = acknowledgement("AIM-1", &NotificationOutcome::Failed("down".into()));
        assert_ne!(degraded, SUBMITTED_MESSAGE);
        assert!(degraded.contains("AIM-1"));
    }
}
