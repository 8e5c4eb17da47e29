//! Shared fixtures for aimclub-recruit integration tests

#![allow(dead_code)]

use aimclub_common::config::ClubConfig;
use aimclub_common::db::{init_database, init_memory_database};
use aimclub_common::events::EventBus;
use aimclub_recruit::error::{Error, Result};
use aimclub_recruit::model::{
    ApplicationPatch, ApplicationRecord, NewApplication, PersonalInfo, YearOfStudy,
};
use aimclub_recruit::notify::{NotificationError, Notifier, OutboundMessage};
use aimclub_recruit::store::{ApplicationFilter, ApplicationStore, SqliteApplicationStore};
use aimclub_recruit::AppState;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@aimclub.example";
pub const SITE_URL: &str = "https://aimclub.example/";

/// Notifier that records every message and fails on demand
#[derive(Default)]
pub struct ScriptedNotifier {
    failing: AtomicBool,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl ScriptedNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn send(&self, message: &OutboundMessage) -> std::result::Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected {
                status: 503,
                body: "relay unavailable".into(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Store wrapper whose first `conflicts` creates collide
pub struct CollidingStore {
    inner: SqliteApplicationStore,
    conflicts: AtomicUsize,
    pub create_attempts: AtomicUsize,
}

impl CollidingStore {
    pub fn new(inner: SqliteApplicationStore, conflicts: usize) -> Self {
        Self {
            inner,
            conflicts: AtomicUsize::new(conflicts),
            create_attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ApplicationStore for CollidingStore {
    async fn create(&self, new: NewApplication) -> Result<ApplicationRecord> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Conflict(format!("{} already exists", new.applicant_id)));
        }
        self.inner.create(new).await
    }

    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> Result<ApplicationRecord> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationRecord> {
        self.inner.get(id).await
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<ApplicationRecord>> {
        self.inner.find_by_tracking_id(tracking_id).await
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>> {
        self.inner.list(filter).await
    }
}

pub fn test_config() -> ClubConfig {
    ClubConfig {
        site_base_url: SITE_URL.to_string(),
        admin_email: ADMIN_EMAIL.to_string(),
        master_key: Some("open-sesame".to_string()),
        ..ClubConfig::default()
    }
}

pub async fn sqlite_store() -> SqliteApplicationStore {
    let pool = init_memory_database().await.expect("in-memory database");
    SqliteApplicationStore::new(pool, EventBus::new(64))
}

/// App state over an in-memory database
pub async fn test_state(notifier: Arc<ScriptedNotifier>, shared_secret: i64) -> AppState {
    let pool = init_memory_database().await.expect("in-memory database");
    AppState::with_pool(pool, notifier, &test_config(), shared_secret)
}

/// App state over a WAL database file with a multi-connection pool
pub async fn file_state(dir: &std::path::Path, notifier: Arc<ScriptedNotifier>) -> AppState {
    let pool = init_database(&dir.join("aimclub.db")).await.expect("file database");
    AppState::with_pool(pool, notifier, &test_config(), 0)
}

pub fn personal_info(year: YearOfStudy) -> PersonalInfo {
    PersonalInfo {
        name: "Asha Rao".into(),
        roll_number: "21CS042".into(),
        email: "asha@college.edu".into(),
        contact: "9876543210".into(),
        year_of_study: year,
    }
}

pub fn new_application(applicant_id: &str, tracking_id: &str) -> NewApplication {
    NewApplication {
        applicant_id: applicant_id.into(),
        tracking_id: tracking_id.into(),
        personal_info: personal_info(YearOfStudy::Third),
        role: "Treasurer".into(),
        answers: BTreeMap::from([
            ("Q1".to_string(), "Ran the hostel mess budget".to_string()),
            ("Q2".to_string(), "Monthly public ledger".to_string()),
            ("Q3".to_string(), "Tiered sponsor packages".to_string()),
        ]),
    }
}

/// Insert a record directly, bypassing the wizard
pub async fn seed(state: &AppState, applicant_id: &str, tracking_id: &str) -> ApplicationRecord {
    state
        .store
        .create(new_application(applicant_id, tracking_id))
        .await
        .expect("seed record")
}
