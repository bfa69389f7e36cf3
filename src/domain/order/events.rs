use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{Actor, BankDetails, OrderStatus, PaymentMethod, RequestKind, RequestStatus};
use crate::domain::cart::{Address, CartLine};
use crate::domain::catalog::BusinessType;
use crate::domain::pricing::PriceBreakdown;
use crate::event_sourcing::DomainEvent;

// ============================================================================
// Order Events
// ============================================================================

/// Everything frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: Uuid,
    pub order_id: String,
    pub order_number: u64,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub business_id: Uuid,
    pub business_type: BusinessType,
    pub items: Vec<CartLine>,
    pub totals: PriceBreakdown,
    pub commission_rate: Decimal,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub delivery_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed {
        snapshot: Box<OrderSnapshot>,
        at: DateTime<Utc>,
    },
    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        by: Actor,
        at: DateTime<Utc>,
    },
    Cancelled {
        from: OrderStatus,
        reason: Option<String>,
        by: Actor,
        at: DateTime<Utc>,
    },
    RefundRequested {
        line_ids: Vec<Uuid>,
        reason: String,
        amount: Decimal,
        bank_details: Option<BankDetails>,
        at: DateTime<Utc>,
    },
    ExchangeRequested {
        exchange_id: Uuid,
        line_ids: Vec<Uuid>,
        reason: String,
        replacement_item_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    /// Partner sat on the request too long; an admin owns it now
    RequestEscalated {
        kind: RequestKind,
        exchange_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    RequestDecided {
        kind: RequestKind,
        exchange_id: Option<Uuid>,
        outcome: RequestStatus,
        by: Actor,
        at: DateTime<Utc>,
    },
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed { .. } => "OrderPlaced",
            OrderEvent::StatusChanged { .. } => "OrderStatusChanged",
            OrderEvent::Cancelled { .. } => "OrderCancelled",
            OrderEvent::RefundRequested { .. } => "OrderRefundRequested",
            OrderEvent::ExchangeRequested { .. } => "OrderExchangeRequested",
            OrderEvent::RequestEscalated { .. } => "OrderRequestEscalated",
            OrderEvent::RequestDecided { .. } => "OrderRequestDecided",
        }
    }
}

impl OrderEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed { at, .. }
            | OrderEvent::StatusChanged { at, .. }
            | OrderEvent::Cancelled { at, .. }
            | OrderEvent::RefundRequested { at, .. }
            | OrderEvent::ExchangeRequested { at, .. }
            | OrderEvent::RequestEscalated { at, .. }
            | OrderEvent::RequestDecided { at, .. } => *at,
        }
    }
}
