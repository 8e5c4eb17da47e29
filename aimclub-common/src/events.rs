//! Event types for the club event system
//!
//! Provides shared event definitions and the EventBus used to push record
//! changes to every connected admin view.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Kind of mutation applied to a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Club event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClubEvent {
    /// An application record was created, updated or deleted
    ///
    /// Triggers:
    /// - SSE: Refresh admin recruitment views
    ApplicationChanged {
        change: ChangeKind,
        /// Internal record id
        application_id: Uuid,
        /// Human-facing applicant id
        applicant_id: String,
        /// Status after the change (wire vocabulary)
        status: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A role definition was added, edited or removed
    RoleCatalogChanged {
        role: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ClubEvent {
    /// Event type name (used as the SSE event field)
    pub fn event_type(&self) -> &'static str {
        match self {
            ClubEvent::ApplicationChanged { .. } => "ApplicationChanged",
            ClubEvent::RoleCatalogChanged { .. } => "RoleCatalogChanged",
        }
    }
}

/// Application change as seen by `on_application_changed` handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationChange {
    pub change: ChangeKind,
    pub application_id: Uuid,
    pub applicant_id: String,
    pub status: String,
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use aimclub_common::events::{ClubEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ClubEvent::RoleCatalogChanged {
///     role: "Treasurer".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "RoleCatalogChanged");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClubEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: ClubEvent) -> Result<usize, broadcast::error::SendError<ClubEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClubEvent) {
        let _ = self.tx.send(event);
    }

    /// Register a handler for every application change
    ///
    /// The handler runs on a spawned task until the bus is dropped or the
    /// returned handle is aborted. Lagged events are skipped with a warning;
    /// listeners should reload from the store when that happens.
    pub fn on_application_changed<F, Fut>(&self, handler: F) -> JoinHandle<()>
    where
        F: Fn(ApplicationChange) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ClubEvent::ApplicationChanged {
                        change,
                        application_id,
                        applicant_id,
                        status,
                        ..
                    }) => {
                        handler(ApplicationChange {
                            change,
                            application_id,
                            applicant_id,
                            status,
                        })
                        .await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Application change listener lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event bus closed, stopping application change listener");
                        break;
                    }
                }
            }
        })
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
