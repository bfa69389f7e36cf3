// ============================================================================
// Notifications
// ============================================================================
//
// Services hand notifications to a `Notifier` and move on; delivery through
// the `Mailer` happens on the dispatcher task and never affects the
// transition that triggered it.
//
// ============================================================================

pub mod dispatcher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::IsTransient;

pub use dispatcher::{DeadLetter, DispatcherConfig, DispatcherStats, NotificationDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    User(Uuid),
    Partner(Uuid),
    Admins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    OrderPlaced,
    OrderStatusChanged,
    ReturnRequested,
    ReturnEscalated,
    ReturnDecided,
    ReservationRequested,
    ReservationDecided,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::OrderPlaced => "order_placed",
            Topic::OrderStatusChanged => "order_status_changed",
            Topic::ReturnRequested => "return_requested",
            Topic::ReturnEscalated => "return_escalated",
            Topic::ReturnDecided => "return_decided",
            Topic::ReservationRequested => "reservation_requested",
            Topic::ReservationDecided => "reservation_decided",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Recipient,
    pub topic: Topic,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient: Recipient, topic: Topic, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            topic,
            subject: subject.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Fire-and-forget sink used by the services.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay unavailable: {0}")]
    Unavailable(String),

    #[error("message rejected: {0}")]
    Rejected(String),
}

impl IsTransient for MailError {
    fn is_transient(&self) -> bool {
        matches!(self, MailError::Unavailable(_))
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        tracing::info!(
            notification_id = %notification.id,
            recipient = ?notification.recipient,
            topic = notification.topic.as_str(),
            subject = %notification.subject,
            "Email sent"
        );
        Ok(())
    }
}
