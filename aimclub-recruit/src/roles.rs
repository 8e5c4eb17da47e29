//! Role catalog
//!
//! Static mapping from role name to eligible years, question set and
//! responsibilities. `RoleCatalog` is a plain value consulted synchronously by
//! the intake wizard; `RoleRegistry` is the shared, editable service that hands
//! out snapshots and applies typed edit commands.

use aimclub_common::events::{ClubEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::YearOfStudy;

/// A club position open for applications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub eligible_years: Vec<YearOfStudy>,
    pub questions: Vec<String>,
    pub responsibilities: Vec<String>,
}

impl RoleDefinition {
    pub fn is_eligible(&self, year: YearOfStudy) -> bool {
        self.eligible_years.contains(&year)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Role name must not be empty".into()));
        }
        if self.eligible_years.is_empty() {
            return Err(Error::Validation(format!(
                "Role '{}' must be open to at least one year of study",
                self.name
            )));
        }
        validate_questions(&self.name, &self.questions)
    }
}

fn validate_questions(role: &str, questions: &[String]) -> Result<()> {
    if questions.is_empty() {
        return Err(Error::Validation(format!("Role '{}' needs at least one question", role)));
    }
    if questions.iter().any(|q| q.trim().is_empty()) {
        return Err(Error::Validation(format!("Role '{}' has an empty question", role)));
    }
    Ok(())
}

/// Ordered set of role definitions keyed by unique name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalog {
    roles: Vec<RoleDefinition>,
}

impl RoleCatalog {
    /// Build a catalog, rejecting duplicate names and malformed roles
    pub fn new(roles: Vec<RoleDefinition>) -> Result<Self> {
        let mut catalog = Self { roles: Vec::with_capacity(roles.len()) };
        for role in roles {
            role.validate()?;
            if catalog.get(&role.name).is_some() {
                return Err(Error::Validation(format!("Duplicate role '{}'", role.name)));
            }
            catalog.roles.push(role);
        }
        Ok(catalog)
    }

    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Roles open to `year`, in catalog order
    pub fn eligible_for(&self, year: YearOfStudy) -> Vec<&RoleDefinition> {
        self.roles.iter().filter(|r| r.is_eligible(year)).collect()
    }

    /// The nine positions of the club committee
    pub fn default_catalog() -> Self {
        use YearOfStudy::*;

        let roles = vec![
            role(
                "President",
                &[Fourth],
                &[
                    "Outline your vision for the club for the next academic year.",
                    "Describe a time you led a team through a significant challenge.",
                    "How would you represent the club to external bodies and potential sponsors?",
                ],
                &[
                    "Sets annual and long-term goals for the club.",
                    "Chairs club meetings and represents the club to faculty and external entities.",
                    "Approves action plans and budgets, ensuring adherence to the club's constitution and code of conduct.",
                    "Fosters leadership within the committee and plans for succession to sustain club growth.",
                    "Acts as the main spokesperson and resolves major conflicts.",
                ],
            ),
            role(
                "Vice President",
                &[Fourth],
                &[
                    "How would you support the President and other committee members?",
                    "Describe your approach to managing internal club operations and conflicts.",
                    "What new initiative would you propose to increase member engagement?",
                ],
                &[
                    "Develops team synergy through regular communication and feedback.",
                    "Takes charge of operational strategies and ensures key deliverables.",
                    "Upholds connections between teams and supports the president in resolving issues efficiently.",
                    "Provides mentorship to junior committee members.",
                    "Leads special projects and takes charge in the president's absence.",
                ],
            ),
            role(
                "Secretary",
                &[Fourth],
                &[
                    "How would you ensure effective communication and documentation within the club?",
                    "Describe your organizational skills and experience with administrative tasks.",
                    "What tools would you use to manage meeting minutes, member records, and official correspondence?",
                ],
                &[
                    "Circulates notices and compiles all documentation, correspondence, and event summaries.",
                    "Organizes elections, maintains up-to-date membership records.",
                    "Communicates with the department and members on behalf of the club.",
                    "Keeps detailed minutes of all meetings for future reference.",
                ],
            ),
            role(
                "Treasurer",
                &[Third, Fourth],
                &[
                    "What experience do you have with financial management or budgeting?",
                    "How would you ensure transparency and accountability in handling club funds?",
                    "Propose a strategy for securing sponsorships for a large-scale event.",
                ],
                &[
                    "Manages and allocates the club's budget responsibly.",
                    "Handles fundraising, maintains financial records and upholds transparency.",
                    "Prepares regular financial reports for the club's review and audit.",
                    "Ensures proper processing of expenses and reimbursements.",
                ],
            ),
            role(
                "Technical Head",
                &[Third, Fourth],
                &[
                    "Describe your technical expertise relevant to AI/ML.",
                    "Propose a technical project the club could undertake.",
                    "How would you mentor members with varying levels of technical skill?",
                ],
                &[
                    "Identifies relevant technologies and courseware for workshops.",
                    "Organizes and leads hands-on training sessions and competitions.",
                    "Ensures that technical resources are accessible for all initiatives.",
                    "Coordinates with resource managers for logistics and lab requirements.",
                ],
            ),
            role(
                "Event Coordinator",
                &[Second, Third, Fourth],
                &[
                    "Describe your experience in planning and executing events.",
                    "How would you manage logistics for a large-scale workshop or hackathon?",
                    "What makes an event successful and memorable for attendees?",
                ],
                &[
                    "Develops the annual event calendar and creates action plans for events.",
                    "Secures venues/resources and manages the logistics of club events.",
                    "Trains and manages volunteer teams to ensure professional event management.",
                    "Collects feedback after events and prepares review reports.",
                ],
            ),
            role(
                "Public Relations & Media Lead",
                &[Third],
                &[
                    "How would you enhance the club's public image and social media presence?",
                    "Describe your content creation skills (graphics, video, writing).",
                    "Outline a promotional campaign for our flagship annual event.",
                ],
                &[
                    "Crafts club communications, news posts, and event promotions.",
                    "Designs digital and print collateral in alignment with club branding.",
                    "Builds and manages relationships with campus media, alumni, and industry partners.",
                    "Increases club visibility via social media and other outreach channels.",
                ],
            ),
            role(
                "Hospitality Lead",
                &[Third, Fourth],
                &[
                    "Why is hospitality crucial for the club's events and image?",
                    "How would you manage guest speakers, judges, and VIPs during an event?",
                    "Describe how you would create a welcoming atmosphere for new members?",
                ],
                &[
                    "Develops hospitality protocols and guest checklists for events.",
                    "Coordinates refreshment, accommodation, and reception logistics.",
                    "Maintains post-event records and feedback sources for continuous improvement.",
                ],
            ),
            role(
                "Executive Member",
                &[Second, Third],
                &[
                    "In what specific area do you want to contribute as an Executive Member?",
                    "How would you take initiative on a new project or task?",
                    "What qualities do you possess that make you a good team player?",
                ],
                &[
                    "Provides support to the main office bearers and contributes to club events.",
                    "Takes on delegated tasks and actively participates in the club's growth.",
                    "Demonstrates initiative and teamwork across club activities.",
                ],
            ),
        ];

        Self { roles }
    }
}

fn role(
    name: &str,
    years: &[YearOfStudy],
    questions: &[&str],
    responsibilities: &[&str],
) -> RoleDefinition {
    RoleDefinition {
        name: name.to_string(),
        eligible_years: years.to_vec(),
        questions: questions.iter().map(|q| q.to_string()).collect(),
        responsibilities: responsibilities.iter().map(|r| r.to_string()).collect(),
    }
}

/// Shared, editable role catalog
///
/// Edits replace whole fields through typed commands and never touch
/// applications already submitted against the previous definition.
#[derive(Clone)]
pub struct RoleRegistry {
    catalog: Arc<RwLock<RoleCatalog>>,
    events: EventBus,
}

impl RoleRegistry {
    pub fn new(catalog: RoleCatalog, events: EventBus) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            events,
        }
    }

    /// Point-in-time copy of the catalog
    pub async fn snapshot(&self) -> RoleCatalog {
        self.catalog.read().await.clone()
    }

    /// Add a role or replace the definition with the same name
    pub async fn upsert_role(&self, definition: RoleDefinition) -> Result<()> {
        definition.validate()?;
        let name = definition.name.clone();
        {
            let mut catalog = self.catalog.write().await;
            match catalog.roles.iter_mut().find(|r| r.name == name) {
                Some(existing) => *existing = definition,
                None => catalog.roles.push(definition),
            }
        }
        info!(role = %name, "Role definition saved");
        self.announce(name);
        Ok(())
    }

    /// Replace the question set of an existing role
    pub async fn update_role_questions(&self, name: &str, questions: Vec<String>) -> Result<()> {
        validate_questions(name, &questions)?;
        {
            let mut catalog = self.catalog.write().await;
            let role = catalog
                .roles
                .iter_mut()
                .find(|r| r.name == name)
                .ok_or_else(|| Error::NotFound(format!("Role '{}'", name)))?;
            role.questions = questions;
        }
        info!(role = %name, "Role questions updated");
        self.announce(name.to_string());
        Ok(())
    }

    /// Remove a role from the catalog
    pub async fn remove_role(&self, name: &str) -> Result<()> {
        {
            let mut catalog = self.catalog.write().await;
            let before = catalog.roles.len();
            catalog.roles.retain(|r| r.name != name);
            if catalog.roles.len() == before {
                return Err(Error::NotFound(format!("Role '{}'", name)));
            }
        }
        info!(role = %name, "Role removed");
        self.announce(name.to_string());
        Ok(())
    }

    fn announce(&self, role: String) {
        self.events.emit_lossy(ClubEvent::RoleCatalogChanged {
            role,
            timestamp: chrono::Utc::now(),
        });
    }
}
