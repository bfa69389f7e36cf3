use chrono::{DateTime, Utc};

use super::value_objects::ReservationStatus;
use crate::domain::order::Actor;

#[derive(Debug, Clone)]
pub enum ReservationCommand {
    UpdateStatus {
        to: ReservationStatus,
        by: Actor,
        now: DateTime<Utc>,
    },
}
