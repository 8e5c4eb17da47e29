//! Form-relay email delivery
//!
//! Posts each message as a form to `<endpoint><admin_email>`. The relay
//! forwards it to the admin inbox and copies the `_cc` address.

use async_trait::async_trait;
use std::time::Duration;

use super::{NotificationError, Notifier, OutboundMessage};

const USER_AGENT: &str = concat!("aimclub-recruit/", env!("CARGO_PKG_VERSION"));

/// Email relay client
pub struct FormSubmitNotifier {
    http_client: reqwest::Client,
    url: String,
}

impl FormSubmitNotifier {
    pub fn new(endpoint: &str, admin_email: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            url: format!("{}{}", endpoint, admin_email),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Relay form fields for a message
pub(crate) fn form_fields(message: &OutboundMessage) -> Vec<(&'static str, String)> {
    let reply_address = message
        .reply_to
        .clone()
        .or_else(|| message.to.first().cloned())
        .unwrap_or_default();

    let mut fields = vec![
        ("name", message.sender_name.clone()),
        ("email", reply_address),
    ];
    if let Some(reply_to) = &message.reply_to {
        fields.push(("_replyto", reply_to.clone()));
    }
    if let Some(cc) = &message.cc {
        fields.push(("_cc", cc.clone()));
    }
    fields.push(("_subject", message.subject.clone()));
    fields.push(("message", message.body.clone()));
    fields.push(("_captcha", "false".to_string()));
    fields
}

#[async_trait]
impl Notifier for FormSubmitNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        tracing::debug!(subject = %message.subject, "Posting message to email relay");

        let response = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form_fields(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::TimedOut
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
