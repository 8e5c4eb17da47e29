//! Application record store
//!
//! The store is the single source of truth for applications. Every successful
//! mutation is published on the event bus after it is committed, so the
//! caller sees its own write before any subscriber does.

mod sqlite;

pub use sqlite::SqliteApplicationStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{ApplicationPatch, ApplicationRecord, NewApplication, Status};

/// Optional narrowing for `list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<Status>,
    pub role: Option<String>,
}

impl ApplicationFilter {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self.role.as_deref().map_or(true, |r| record.role == r)
    }
}

/// Canonical application storage
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert a new record at `Pending`
    ///
    /// Fails with `Conflict` when the applicant id or tracking token is taken.
    async fn create(&self, new: NewApplication) -> Result<ApplicationRecord>;

    /// Apply a patch to an existing record and return the result
    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> Result<ApplicationRecord>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<ApplicationRecord>;

    /// Exact-match lookup by tracking token
    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<ApplicationRecord>>;

    /// Records matching `filter`, newest submission first
    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>>;
}
