use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{Address, CartLine, CartOwner, ClearReason};
use crate::domain::pricing::LineTerms;
use crate::event_sourcing::DomainEvent;

// ============================================================================
// Cart Events
// ============================================================================
//
// Line events carry the commission rate in force when they happened, so the
// cart can be re-priced from its own log.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    Opened {
        cart_id: Uuid,
        owner: CartOwner,
        at: DateTime<Utc>,
    },
    LineAdded {
        line: CartLine,
        commission_rate: Decimal,
        at: DateTime<Utc>,
    },
    /// Same offer added again; `terms` hold the summed quantity
    LineMerged {
        line_id: Uuid,
        terms: LineTerms,
        commission_rate: Decimal,
        at: DateTime<Utc>,
    },
    /// A room booked again replaces the previous stay
    LineReplaced {
        line: CartLine,
        commission_rate: Decimal,
        at: DateTime<Utc>,
    },
    LineQuantityChanged {
        line_id: Uuid,
        quantity: i64,
        commission_rate: Decimal,
        at: DateTime<Utc>,
    },
    LineRemoved {
        line_id: Uuid,
        commission_rate: Decimal,
        at: DateTime<Utc>,
    },
    DeliveryAddressSet {
        address: Address,
        at: DateTime<Utc>,
    },
    Cleared {
        reason: ClearReason,
        at: DateTime<Utc>,
    },
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::Opened { .. } => "CartOpened",
            CartEvent::LineAdded { .. } => "CartLineAdded",
            CartEvent::LineMerged { .. } => "CartLineMerged",
            CartEvent::LineReplaced { .. } => "CartLineReplaced",
            CartEvent::LineQuantityChanged { .. } => "CartLineQuantityChanged",
            CartEvent::LineRemoved { .. } => "CartLineRemoved",
            CartEvent::DeliveryAddressSet { .. } => "CartDeliveryAddressSet",
            CartEvent::Cleared { .. } => "CartCleared",
        }
    }
}

impl CartEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::Opened { at, .. }
            | CartEvent::LineAdded { at, .. }
            | CartEvent::LineMerged { at, .. }
            | CartEvent::LineReplaced { at, .. }
            | CartEvent::LineQuantityChanged { at, .. }
            | CartEvent::LineRemoved { at, .. }
            | CartEvent::DeliveryAddressSet { at, .. }
            | CartEvent::Cleared { at, .. } => *at,
        }
    }

    pub fn commission_rate(&self) -> Option<Decimal> {
        match self {
            CartEvent::LineAdded { commission_rate, .. }
            | CartEvent::LineMerged { commission_rate, .. }
            | CartEvent::LineReplaced { commission_rate, .. }
            | CartEvent::LineQuantityChanged { commission_rate, .. }
            | CartEvent::LineRemoved { commission_rate, .. } => Some(*commission_rate),
            _ => None,
        }
    }
}
