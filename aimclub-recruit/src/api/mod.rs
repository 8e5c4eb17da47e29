//! HTTP API handlers for aimclub-recruit

pub mod admin;
pub mod auth;
pub mod health;
pub mod login;
pub mod public;
pub mod sse;

pub use admin::{
    bulk_set_status, delete_application, export_applications, get_application, get_briefings,
    get_calendar, get_metrics, list_applications, mark_viewed, schedule_interview, set_status,
    update_role_questions,
};
pub use auth::auth_middleware;
pub use health::health_routes;
pub use login::{login, request_access_code, verify_access_code};
pub use public::{list_roles, submit_application, track_application};
pub use sse::event_stream;
