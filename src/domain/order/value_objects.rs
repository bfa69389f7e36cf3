use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Processing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Accepted | OrderStatus::Processing
        )
    }

    /// The only place order transitions are defined.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Accepted, Processing)
                | (Processing, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (Processing, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Processing => "processing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Refund / Exchange Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Refund,
    Exchange,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Refund => "refund",
            RequestKind::Exchange => "exchange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingPartner,
    PendingAdmin,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Still waiting for a decision
    pub fn is_open(self) -> bool {
        matches!(self, RequestStatus::PendingPartner | RequestStatus::PendingAdmin)
    }

    pub fn can_transition(self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, to),
            (PendingPartner, Approved)
                | (PendingPartner, Rejected)
                | (PendingPartner, PendingAdmin)
                | (PendingAdmin, Approved)
                | (PendingAdmin, Rejected)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::PendingPartner => "pending_partner",
            RequestStatus::PendingAdmin => "pending_admin",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn outcome(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_holder: String,
    pub account_number: String,
    pub bank_name: String,
    #[serde(default)]
    pub routing_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub line_ids: Vec<Uuid>,
    pub reason: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Line price plus tax of the refunded lines
    pub amount: Decimal,
    pub bank_details: Option<BankDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDetails {
    pub exchange_id: Uuid,
    pub line_ids: Vec<Uuid>,
    pub reason: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub replacement_item_id: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Actors & Payment
// ============================================================================

/// Who is asking. Authorization rules live in the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Customer(Uuid),
    Partner(Uuid),
    Admin(Uuid),
    Scheduler,
}

impl Actor {
    pub fn id(self) -> Option<Uuid> {
        match self {
            Actor::Customer(id) | Actor::Partner(id) | Actor::Admin(id) => Some(id),
            Actor::Scheduler => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    BankTransfer,
    Wallet,
}

// ============================================================================
// Transaction Ledger
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Placed,
    StatusChange,
    Refund,
    Exchange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "status", rename_all = "snake_case")]
pub enum LedgerStatus {
    Order(OrderStatus),
    Refund(RequestStatus),
    Exchange(RequestStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_type: LedgerEntryType,
    pub status: LedgerStatus,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}
