//! aimclub-recruit library - A.I.M. Club recruitment service
//!
//! Applicant intake, tracking by opaque token, and the admin-side status
//! lifecycle with notification side effects and audit logging.

use aimclub_common::config::ClubConfig;
use aimclub_common::events::EventBus;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod admin_gate;
pub mod api;
pub mod dashboard;
pub mod error;
pub mod ids;
pub mod intake;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod roles;
pub mod store;
pub mod tracking;

pub use error::{Error, Result};

use admin_gate::AdminGate;
use intake::IntakeService;
use lifecycle::LifecycleController;
use model::ApplicationRecord;
use notify::{NotificationDispatch, Notifier, NotifyTargets};
use roles::{RoleCatalog, RoleRegistry};
use store::{ApplicationFilter, ApplicationStore, SqliteApplicationStore};
use tracking::TrackingResolver;

/// Application state shared across HTTP handlers
///
/// Reads go through `applications`/`application`; every mutation goes through
/// one of the service handles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApplicationStore>,
    pub roles: RoleRegistry,
    pub intake: IntakeService,
    pub lifecycle: LifecycleController,
    pub tracking: TrackingResolver,
    pub gate: Arc<AdminGate>,
    pub events: EventBus,
    /// Shared secret for admin API authentication (0 disables checking)
    pub shared_secret: i64,
}

impl AppState {
    /// Wire the services over an arbitrary store
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
        config: &ClubConfig,
        shared_secret: i64,
    ) -> Self {
        let dispatch = NotificationDispatch::new(
            notifier,
            Duration::from_secs(config.notifier.timeout_secs.max(1)),
        );
        let targets = NotifyTargets::from(config);

        Self {
            roles: RoleRegistry::new(RoleCatalog::default_catalog(), events.clone()),
            intake: IntakeService::new(store.clone(), dispatch.clone(), targets.clone()),
            lifecycle: LifecycleController::new(store.clone(), dispatch.clone(), targets.clone()),
            tracking: TrackingResolver::new(store.clone()),
            gate: Arc::new(AdminGate::new(
                config.master_key.clone(),
                shared_secret,
                config.admin_email.clone(),
                Duration::from_secs(config.otp.ttl_secs),
                dispatch,
            )),
            store,
            events,
            shared_secret,
        }
    }

    /// Wire the services over the SQLite store
    pub fn with_pool(
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        config: &ClubConfig,
        shared_secret: i64,
    ) -> Self {
        let events = EventBus::new(config.event_bus_capacity);
        let store = Arc::new(SqliteApplicationStore::new(pool, events.clone()));
        Self::new(store, notifier, events, config, shared_secret)
    }

    pub async fn applications(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>> {
        self.store.list(filter).await
    }

    pub async fn application(&self, id: Uuid) -> Result<ApplicationRecord> {
        self.store.get(id).await
    }
}

/// Build application router
///
/// `/health`, role listing, submission, tracking and the login routes are
/// public; everything else under `/api/admin` requires authentication.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/admin/applications", get(api::list_applications))
        .route("/api/admin/applications/export.csv", get(api::export_applications))
        .route("/api/admin/applications/bulk-status", post(api::bulk_set_status))
        .route(
            "/api/admin/applications/:id",
            get(api::get_application).delete(api::delete_application),
        )
        .route("/api/admin/applications/:id/status", post(api::set_status))
        .route("/api/admin/applications/:id/interview", post(api::schedule_interview))
        .route("/api/admin/applications/:id/viewed", post(api::mark_viewed))
        .route("/api/admin/metrics", get(api::get_metrics))
        .route("/api/admin/briefings", get(api::get_briefings))
        .route("/api/admin/calendar", get(api::get_calendar))
        .route("/api/admin/roles/:name/questions", put(api::update_role_questions))
        .route("/api/admin/events", get(api::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/roles", get(api::list_roles))
        .route("/api/applications", post(api::submit_application))
        .route("/api/track/:token", get(api::track_application))
        .route("/api/admin/login", post(api::login))
        .route("/api/admin/otp", post(api::request_access_code))
        .route("/api/admin/otp/verify", post(api::verify_access_code))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
