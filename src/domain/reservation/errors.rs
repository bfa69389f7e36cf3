use chrono::NaiveDateTime;
use uuid::Uuid;

use super::value_objects::ReservationStatus;
use crate::error::{Classify, ErrorKind};
use crate::event_sourcing::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("reservation {0} not found")]
    NotFound(Uuid),

    #[error("partner {0} not found")]
    PartnerNotFound(Uuid),

    #[error("business {0} not found")]
    BusinessNotFound(Uuid),

    #[error("business {business_id} does not belong to partner {partner_id}")]
    BusinessNotOwned { business_id: Uuid, partner_id: Uuid },

    #[error("reservations are not enabled for this business")]
    FeatureDisabled,

    #[error("at least one guest is required")]
    InvalidGuests,

    #[error("business is closed at {0}")]
    OutsideHours(NaiveDateTime),

    #[error("{0} is already booked")]
    SlotTaken(NaiveDateTime),

    #[error("an accepted reservation cannot be rejected")]
    AlreadyAcceptedCannotReject,

    #[error("reservation is {0}, no further changes allowed")]
    TerminalState(ReservationStatus),

    #[error("cannot move reservation from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("not allowed to act on this reservation")]
    Unauthorized,

    #[error("reservation not initialized")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upstream lookup failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl Classify for ReservationError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::NotFound(_)
            | ReservationError::PartnerNotFound(_)
            | ReservationError::BusinessNotFound(_) => ErrorKind::NotFound,
            ReservationError::BusinessNotOwned { .. } | ReservationError::InvalidGuests => ErrorKind::Validation,
            ReservationError::Unauthorized => ErrorKind::Unauthorized,
            ReservationError::FeatureDisabled
            | ReservationError::OutsideHours(_)
            | ReservationError::SlotTaken(_)
            | ReservationError::AlreadyAcceptedCannotReject
            | ReservationError::TerminalState(_)
            | ReservationError::InvalidTransition { .. } => ErrorKind::StateGuard,
            ReservationError::Store(e) => e.kind(),
            ReservationError::NotInitialized | ReservationError::Upstream(_) => ErrorKind::Infrastructure,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ReservationError::NotFound(_) => "NOT_FOUND",
            ReservationError::PartnerNotFound(_) => "PARTNER_NOT_FOUND",
            ReservationError::BusinessNotFound(_) => "BUSINESS_NOT_FOUND",
            ReservationError::BusinessNotOwned { .. } => "BUSINESS_NOT_OWNED",
            ReservationError::FeatureDisabled => "FEATURE_DISABLED",
            ReservationError::InvalidGuests => "INVALID_GUESTS",
            ReservationError::OutsideHours(_) => "OUTSIDE_HOURS",
            ReservationError::SlotTaken(_) => "SLOT_TAKEN",
            ReservationError::AlreadyAcceptedCannotReject => "ALREADY_ACCEPTED_CANNOT_REJECT",
            ReservationError::TerminalState(_) => "TERMINAL_STATE",
            ReservationError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ReservationError::Unauthorized => "UNAUTHORIZED",
            ReservationError::NotInitialized => "NOT_INITIALIZED",
            ReservationError::Store(e) => e.code(),
            ReservationError::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }
}
