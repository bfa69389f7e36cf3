use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::value_objects::{Actor, BankDetails, Decision, OrderStatus, RequestKind};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    ChangeStatus {
        to: OrderStatus,
        by: Actor,
        now: DateTime<Utc>,
    },
    Respond {
        partner_id: Uuid,
        accept: bool,
        now: DateTime<Utc>,
    },
    Cancel {
        reason: Option<String>,
        by: Actor,
        now: DateTime<Utc>,
    },
    RequestRefund {
        user_id: Uuid,
        line_ids: Vec<Uuid>,
        reason: String,
        bank_details: Option<BankDetails>,
        now: DateTime<Utc>,
    },
    RequestExchange {
        user_id: Uuid,
        line_ids: Vec<Uuid>,
        reason: String,
        replacement_item_id: Option<Uuid>,
        now: DateTime<Utc>,
    },
    Decide {
        kind: RequestKind,
        decision: Decision,
        by: Actor,
        now: DateTime<Utc>,
    },
    /// Hand partner-owned requests older than `threshold` to admins
    Escalate {
        threshold: Duration,
        now: DateTime<Utc>,
    },
}
