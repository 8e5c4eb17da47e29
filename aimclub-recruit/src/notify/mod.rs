//! Outbound notifications
//!
//! A `Notifier` delivers one templated message. Delivery is never part of a
//! state change: callers go through `NotificationDispatch`, which bounds each
//! attempt by the configured timeout and folds every failure into a
//! `NotificationOutcome` reported beside the mutation result.

pub mod formsubmit;
pub mod templates;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use formsubmit::FormSubmitNotifier;

/// Notification delivery errors
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// Relay answered with a non-success status
    #[error("Relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Delivery timed out")]
    TimedOut,

    /// Delivery switched off in configuration
    #[error("Notifications are disabled")]
    Disabled,
}

/// A message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Display name shown as the sender
    pub sender_name: String,
    pub to: Vec<String>,
    pub cc: Option<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Delivers messages to recipients
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotificationError>;
}

/// Stand-in used when delivery is disabled; logs the message and reports `Disabled`
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        info!(
            to = ?message.to,
            cc = ?message.cc,
            subject = %message.subject,
            "Notification not sent (delivery disabled)"
        );
        debug!("Message body:\n{}", message.body);
        Err(NotificationError::Disabled)
    }
}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    Failed(String),
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            NotificationOutcome::Delivered => None,
            NotificationOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Wire form of a `NotificationOutcome`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<&NotificationOutcome> for NotificationReport {
    fn from(outcome: &NotificationOutcome) -> Self {
        Self {
            delivered: outcome.is_delivered(),
            warning: outcome.warning().map(str::to_string),
        }
    }
}

/// Where notifications point: the admin inbox and the public tracking page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTargets {
    pub admin_email: String,
    pub site_base_url: String,
}

impl NotifyTargets {
    pub fn tracking_link(&self, tracking_id: &str) -> String {
        aimclub_common::config::tracking_link(&self.site_base_url, tracking_id)
    }
}

impl From<&aimclub_common::config::ClubConfig> for NotifyTargets {
    fn from(config: &aimclub_common::config::ClubConfig) -> Self {
        Self {
            admin_email: config.admin_email.clone(),
            site_base_url: config.site_base_url.clone(),
        }
    }
}

/// Shared notifier handle with a per-attempt time bound
#[derive(Clone)]
pub struct NotificationDispatch {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationDispatch {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Attempt delivery, surfacing the error
    pub async fn try_send(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        match tokio::time::timeout(self.timeout, self.notifier.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::TimedOut),
        }
    }

    /// Attempt delivery; failures are logged and returned as an outcome
    pub async fn deliver(&self, message: &OutboundMessage) -> NotificationOutcome {
        match self.try_send(message).await {
            Ok(()) => {
                debug!(subject = %message.subject, "Notification delivered");
                NotificationOutcome::Delivered
            }
            Err(e) => {
                warn!(subject = %message.subject, error = %e, "Notification failed");
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}
