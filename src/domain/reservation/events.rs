use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::DinnerType;
use crate::domain::order::Actor;
use crate::event_sourcing::DomainEvent;

/// Validated request details, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub id: Uuid,
    pub request_number: u64,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub business_id: Uuid,
    /// Business-local time
    pub date_time: NaiveDateTime,
    pub guests: u32,
    pub dinner_type: DinnerType,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReservationEvent {
    Requested {
        draft: ReservationDraft,
        at: DateTime<Utc>,
    },
    Accepted {
        booking_id: String,
        by: Actor,
        at: DateTime<Utc>,
    },
    Rejected {
        by: Actor,
        at: DateTime<Utc>,
    },
}

impl DomainEvent for ReservationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::Requested { .. } => "ReservationRequested",
            ReservationEvent::Accepted { .. } => "ReservationAccepted",
            ReservationEvent::Rejected { .. } => "ReservationRejected",
        }
    }
}

impl ReservationEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            ReservationEvent::Requested { at, .. }
            | ReservationEvent::Accepted { at, .. }
            | ReservationEvent::Rejected { at, .. } => *at,
        }
    }
}
