use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{Address, ClearReason};
use crate::domain::pricing::{LineSelection, LineTerms};

// ============================================================================
// Cart Commands
// ============================================================================
//
// Catalog lookups and pricing-term resolution happen in the service; the
// aggregate receives resolved terms and enforces the cart's own rules.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum CartCommand {
    AddLine {
        item_id: Uuid,
        business_id: Uuid,
        name: String,
        selection: LineSelection,
        terms: LineTerms,
        delivery_address: Option<Address>,
        commission_rate: Decimal,
        now: DateTime<Utc>,
    },
    UpdateLine {
        line_id: Uuid,
        quantity: i64,
        commission_rate: Decimal,
        now: DateTime<Utc>,
    },
    RemoveLine {
        line_id: Uuid,
        commission_rate: Decimal,
        now: DateTime<Utc>,
    },
    Clear {
        reason: ClearReason,
        now: DateTime<Utc>,
    },
}
