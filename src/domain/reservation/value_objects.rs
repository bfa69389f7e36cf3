use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReservationStatus {
    /// Pending and accepted requests hold their slot.
    pub fn holds_slot(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Accepted)
    }

    pub fn can_transition(self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!((self, to), (Pending, Accepted) | (Pending, Rejected))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Accepted => "accepted",
            ReservationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DinnerType {
    Breakfast,
    Lunch,
    Dinner,
}
