//! Admin access gate
//!
//! Hands out the API shared secret to an admin who presents either the
//! configured master key or a one-time code mailed to the admin inbox on a
//! staff member's request. There are no user accounts.

use aimclub_common::api::{constant_time_eq, generate_access_code};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::notify::{templates, NotificationDispatch};

struct PendingCode {
    code: String,
    staff_name: String,
    expires_at: Instant,
}

/// Master-key and one-time-code login
pub struct AdminGate {
    master_key: Option<String>,
    shared_secret: i64,
    admin_email: String,
    code_ttl: Duration,
    notifications: NotificationDispatch,
    pending: Mutex<Option<PendingCode>>,
}

impl AdminGate {
    pub fn new(
        master_key: Option<String>,
        shared_secret: i64,
        admin_email: String,
        code_ttl: Duration,
        notifications: NotificationDispatch,
    ) -> Self {
        Self {
            master_key: master_key.filter(|k| !k.is_empty()),
            shared_secret,
            admin_email,
            code_ttl,
            notifications,
            pending: Mutex::new(None),
        }
    }

    /// Exchange the master key for the shared secret
    pub fn login_with_master_key(&self, key: &str) -> Result<i64> {
        let expected = self
            .master_key
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("Master key login is disabled".into()))?;

        if !constant_time_eq(key, expected) {
            warn!("Rejected master key login");
            return Err(Error::Unauthorized("Invalid master key".into()));
        }

        info!("Admin logged in with master key");
        Ok(self.shared_secret)
    }

    /// Mail a fresh one-time code to the admin inbox
    ///
    /// Replaces any outstanding code. Nothing is kept if delivery fails.
    pub async fn request_access_code(&self, staff_name: &str) -> Result<()> {
        let staff_name = staff_name.trim();
        if staff_name.is_empty() {
            return Err(Error::Validation("Staff name is required".into()));
        }

        let code = generate_access_code();
        let message = templates::access_code(&code, staff_name, &self.admin_email);
        self.notifications.try_send(&message).await?;

        *self.pending.lock().await = Some(PendingCode {
            code,
            staff_name: staff_name.to_string(),
            expires_at: Instant::now() + self.code_ttl,
        });

        info!(staff = %staff_name, "One-time access code issued");
        Ok(())
    }

    /// Redeem the outstanding code for the shared secret
    ///
    /// A correct code is consumed. A wrong code leaves it in place.
    pub async fn verify_access_code(&self, code: &str) -> Result<i64> {
        let mut pending = self.pending.lock().await;

        let current = pending
            .as_ref()
            .ok_or_else(|| Error::Unauthorized("No access code has been requested".into()))?;

        if Instant::now() >= current.expires_at {
            *pending = None;
            return Err(Error::Unauthorized("Access code has expired".into()));
        }

        if !constant_time_eq(code.trim(), &current.code) {
            warn!("Rejected one-time access code");
            return Err(Error::Unauthorized("Access code does not match".into()));
        }

        if let Some(redeemed) = pending.take() {
            info!(staff = %redeemed.staff_name, "Delegated admin access granted");
        }
        Ok(self.shared_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationError, Notifier, OutboundMessage};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Keeps the last message so tests can read the code out of it
    #[derive(Default)]
    struct CapturingNotifier {
        last: std::sync::Mutex<Option<OutboundMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CapturingNotifier {
        async fn send(&self, message: &OutboundMessage) -> std::result::Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Transport("relay offline".into()));
            }
            *self.last.lock().unwrap() = Some(message.clone());
            Ok(())
        }
    }

    fn gate(notifier: Arc<CapturingNotifier>, ttl: Duration) -> AdminGate {
        AdminGate::new(
            Some("open-sesame".into()),
            4242,
            "admin@aimclub.example".into(),
            ttl,
            NotificationDispatch::new(notifier, Duration::from_secs(1)),
        )
    }

    fn mailed_code(notifier: &CapturingNotifier) -> String {
        let subject = notifier.last.lock().unwrap().as_ref().unwrap().subject.clone();
        subject.trim_start_matches("SECURE ACCESS CODE: ").to_string()
    }

    #[test]
    fn test_master_key() {
        let g = gate(Arc::new(CapturingNotifier::default()), Duration::from_secs(60));
        assert_eq!(g.login_with_master_key("open-sesame").unwrap(), 4242);
        assert!(matches!(g.login_with_master_key("guess"), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_master_key_disabled_when_unset() {
        let g = AdminGate::new(
            None,
            1,
            "admin@aimclub.example".into(),
            Duration::from_secs(60),
            NotificationDispatch::new(Arc::new(CapturingNotifier::default()), Duration::from_secs(1)),
        );
        assert!(g.login_with_master_key("").is_err());
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let notifier = Arc::new(CapturingNotifier::default());
        let g = gate(notifier.clone(), Duration::from_secs(60));

        g.request_access_code("Ravi").await.unwrap();
        let code = mailed_code(&notifier);
        assert_eq!(code.len(), 6);

        assert!(g.verify_access_code("000000x").await.is_err());
        assert_eq!(g.verify_access_code(&code).await.unwrap(), 4242);
        assert!(g.verify_access_code(&code).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let notifier = Arc::new(CapturingNotifier::default());
        let g = gate(notifier.clone(), Duration::ZERO);

        g.request_access_code("Ravi").await.unwrap();
        let code = mailed_code(&notifier);
        assert!(matches!(g.verify_access_code(&code).await, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_no_code() {
        let notifier = Arc::new(CapturingNotifier {
            fail: true,
            ..Default::default()
        });
        let g = gate(notifier, Duration::from_secs(60));

        assert!(matches!(g.request_access_code("Ravi").await, Err(Error::Notification(_))));
        assert!(g.verify_access_code("123456").await.is_err());
        assert!(matches!(g.request_access_code("  ").await, Err(Error::Validation(_))));
    }
}
