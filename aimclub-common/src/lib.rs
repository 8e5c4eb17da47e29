//! # A.I.M. Club Common Library
//!
//! Shared code for the club services including:
//! - Configuration loading
//! - Database initialization
//! - Event types (ClubEvent enum) and the EventBus
//! - API authentication primitives
//! - SSE helpers
//! - Time utilities

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
