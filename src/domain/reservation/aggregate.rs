use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::ReservationCommand;
use super::errors::ReservationError;
use super::events::{ReservationDraft, ReservationEvent};
use super::value_objects::{DinnerType, ReservationStatus};
use crate::domain::catalog::Business;
use crate::domain::order::Actor;
use crate::event_sourcing::Aggregate;

// ============================================================================
// Reservation Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub version: i64,
    pub request_number: u64,
    /// Set once on acceptance, never changed afterwards
    pub booking_id: Option<String>,

    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub business_id: Uuid,
    pub date_time: NaiveDateTime,
    pub guests: u32,
    pub dinner_type: DinnerType,
    pub note: Option<String>,

    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Check a new request against the business and the reservations it
    /// already holds, and produce the creation event.
    pub fn request(
        draft: ReservationDraft,
        business: &Business,
        existing: &[Reservation],
        now: DateTime<Utc>,
    ) -> Result<ReservationEvent, ReservationError> {
        if business.partner_id != draft.partner_id {
            return Err(ReservationError::BusinessNotOwned {
                business_id: business.id,
                partner_id: draft.partner_id,
            });
        }
        if !business.reservations_enabled {
            return Err(ReservationError::FeatureDisabled);
        }
        if draft.guests < 1 {
            return Err(ReservationError::InvalidGuests);
        }
        if !business.is_open_at(draft.date_time) {
            return Err(ReservationError::OutsideHours(draft.date_time));
        }
        // Exact-time match only; overlapping sittings are the partner's call
        let taken = existing.iter().any(|r| {
            r.business_id == business.id && r.status.holds_slot() && r.date_time == draft.date_time
        });
        if taken {
            return Err(ReservationError::SlotTaken(draft.date_time));
        }

        Ok(ReservationEvent::Requested { draft, at: now })
    }

    fn may_decide(&self, by: Actor) -> bool {
        match by {
            Actor::Partner(id) => id == self.partner_id,
            Actor::Admin(_) => true,
            Actor::Customer(_) | Actor::Scheduler => false,
        }
    }
}

/// Timestamp to the second plus the low digits of the request number.
pub fn booking_id_for(request_number: u64, now: DateTime<Utc>) -> String {
    format!("{}{:04}", now.format("%y%m%d%H%M%S"), request_number % 10_000)
}

impl Aggregate for Reservation {
    type Event = ReservationEvent;
    type Command = ReservationCommand;
    type Error = ReservationError;

    const AGGREGATE_TYPE: &'static str = "reservation";

    fn apply_first_event(event: &ReservationEvent) -> Result<Self, ReservationError> {
        match event {
            ReservationEvent::Requested { draft, at } => {
                let draft = draft.clone();
                Ok(Self {
                    id: draft.id,
                    version: 0,
                    request_number: draft.request_number,
                    booking_id: None,
                    user_id: draft.user_id,
                    partner_id: draft.partner_id,
                    business_id: draft.business_id,
                    date_time: draft.date_time,
                    guests: draft.guests,
                    dinner_type: draft.dinner_type,
                    note: draft.note,
                    status: ReservationStatus::Pending,
                    created_at: *at,
                    updated_at: *at,
                    decided_at: None,
                })
            }
            _ => Err(ReservationError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &ReservationEvent) -> Result<(), ReservationError> {
        let at = event.at();
        self.updated_at = at;
        match event {
            ReservationEvent::Requested { .. } => {}
            ReservationEvent::Accepted { booking_id, .. } => {
                self.status = ReservationStatus::Accepted;
                self.booking_id = Some(booking_id.clone());
                self.decided_at = Some(at);
            }
            ReservationEvent::Rejected { .. } => {
                self.status = ReservationStatus::Rejected;
                self.decided_at = Some(at);
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &ReservationCommand) -> Result<Vec<ReservationEvent>, ReservationError> {
        match command {
            ReservationCommand::UpdateStatus { to, by, now } => {
                if !self.may_decide(*by) {
                    return Err(ReservationError::Unauthorized);
                }
                match (self.status, *to) {
                    (ReservationStatus::Rejected, _) => {
                        return Err(ReservationError::TerminalState(self.status));
                    }
                    (ReservationStatus::Accepted, ReservationStatus::Rejected) => {
                        return Err(ReservationError::AlreadyAcceptedCannotReject);
                    }
                    (from, to) if !from.can_transition(to) => {
                        return Err(ReservationError::InvalidTransition { from, to });
                    }
                    _ => {}
                }

                let event = match to {
                    ReservationStatus::Accepted => ReservationEvent::Accepted {
                        booking_id: booking_id_for(self.request_number, *now),
                        by: *by,
                        at: *now,
                    },
                    _ => ReservationEvent::Rejected { by: *by, at: *now },
                };
                Ok(vec![event])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}
