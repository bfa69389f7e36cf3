use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::{OrderEvent, OrderSnapshot};
use super::value_objects::*;
use crate::domain::cart::{Address, CartLine};
use crate::domain::catalog::{BusinessType, ItemKind};
use crate::domain::pricing::PriceBreakdown;
use crate::event_sourcing::Aggregate;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub version: i64,
    pub order_id: String,
    pub order_number: u64,

    // Parties
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub business_id: Uuid,
    pub business_type: BusinessType,

    // Price snapshot, never changed after placement
    pub items: Vec<CartLine>,
    pub totals: PriceBreakdown,
    pub commission_rate: Decimal,

    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub delivery_address: Option<Address>,
    pub transaction_history: Vec<LedgerEntry>,
    pub refund: Option<RefundDetails>,
    pub exchanges: Vec<ExchangeDetails>,
    pub cancellation_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate a checkout snapshot and produce the placement event.
    pub fn place(snapshot: OrderSnapshot, now: DateTime<Utc>) -> Result<OrderEvent, OrderError> {
        if snapshot.items.is_empty() {
            return Err(OrderError::CartEmpty);
        }
        let needs_delivery = snapshot.items.iter().any(|l| l.terms.kind.needs_delivery());
        if needs_delivery && snapshot.delivery_address.is_none() {
            return Err(OrderError::AddressRequired);
        }
        Ok(OrderEvent::Placed {
            snapshot: Box::new(snapshot),
            at: now,
        })
    }

    pub fn open_exchange(&self) -> Option<&ExchangeDetails> {
        self.exchanges.iter().find(|e| e.status.is_open())
    }

    pub fn open_refund(&self) -> Option<&RefundDetails> {
        self.refund.as_ref().filter(|r| r.status.is_open())
    }

    /// Whether any partner-owned request was filed before `now - threshold`.
    pub fn escalation_due(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        !self.stale_requests(now, threshold).is_empty()
    }

    fn stale_requests(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<(RequestKind, Option<Uuid>)> {
        let cutoff = now - threshold;
        let stale = |status: RequestStatus, requested_at: DateTime<Utc>| {
            status == RequestStatus::PendingPartner && requested_at < cutoff
        };

        let mut due = Vec::new();
        if let Some(refund) = &self.refund {
            if stale(refund.status, refund.requested_at) {
                due.push((RequestKind::Refund, None));
            }
        }
        for exchange in &self.exchanges {
            if stale(exchange.status, exchange.requested_at) {
                due.push((RequestKind::Exchange, Some(exchange.exchange_id)));
            }
        }
        due
    }

    fn approved_refund_lines(&self) -> &[Uuid] {
        match &self.refund {
            Some(refund) if refund.status == RequestStatus::Approved => &refund.line_ids,
            _ => &[],
        }
    }

    /// Deduplicated product lines for a refund/exchange request.
    fn returnable_lines(&self, line_ids: &[Uuid]) -> Result<Vec<&CartLine>, OrderError> {
        if line_ids.is_empty() {
            return Err(OrderError::NoLinesSelected);
        }
        let mut ids = line_ids.to_vec();
        ids.sort();
        ids.dedup();

        ids.into_iter()
            .map(|id| {
                let line = self
                    .items
                    .iter()
                    .find(|l| l.line_id == id)
                    .ok_or(OrderError::LineNotFound(id))?;
                if line.terms.kind != ItemKind::Product {
                    return Err(OrderError::NotProductLine(id));
                }
                Ok(line)
            })
            .collect()
    }

    fn ensure_returns_open(&self, user_id: Uuid) -> Result<(), OrderError> {
        if user_id != self.user_id {
            return Err(OrderError::Unauthorized);
        }
        if self.status != OrderStatus::Delivered {
            return Err(OrderError::NotDelivered(self.status));
        }
        Ok(())
    }

    fn may_fulfil(&self, by: Actor) -> bool {
        match by {
            Actor::Partner(id) => id == self.partner_id,
            Actor::Admin(_) => true,
            Actor::Customer(_) | Actor::Scheduler => false,
        }
    }

    fn may_cancel(&self, by: Actor) -> bool {
        match by {
            Actor::Customer(id) => id == self.user_id,
            other => self.may_fulfil(other),
        }
    }

    /// Partners decide fresh requests, admins decide escalated ones.
    fn may_decide(&self, status: RequestStatus, by: Actor) -> bool {
        match (status, by) {
            (RequestStatus::PendingPartner, Actor::Partner(id)) => id == self.partner_id,
            (RequestStatus::PendingAdmin, Actor::Admin(_)) => true,
            _ => false,
        }
    }

    fn cancel(&self, reason: Option<String>, by: Actor, now: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.may_cancel(by) {
            return Err(OrderError::Unauthorized);
        }
        if self.status.is_terminal() {
            return Err(OrderError::TerminalState(self.status));
        }
        if !self.status.is_cancellable() {
            return Err(OrderError::NotCancellable(self.status));
        }
        Ok(vec![OrderEvent::Cancelled {
            from: self.status,
            reason,
            by,
            at: now,
        }])
    }

    fn record(&mut self, entry_type: LedgerEntryType, status: LedgerStatus, amount: Decimal, at: DateTime<Utc>) {
        self.transaction_history.push(LedgerEntry {
            entry_type,
            status,
            amount,
            timestamp: at,
        });
    }

    fn exchange_mut(&mut self, exchange_id: Option<Uuid>) -> Result<&mut ExchangeDetails, OrderError> {
        self.exchanges
            .iter_mut()
            .find(|e| Some(e.exchange_id) == exchange_id)
            .ok_or(OrderError::NoOpenRequest(RequestKind::Exchange))
    }

    fn set_request_status(
        &mut self,
        kind: RequestKind,
        exchange_id: Option<Uuid>,
        status: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let decided = matches!(status, RequestStatus::Approved | RequestStatus::Rejected);
        match kind {
            RequestKind::Refund => {
                let refund = self
                    .refund
                    .as_mut()
                    .ok_or(OrderError::NoOpenRequest(RequestKind::Refund))?;
                refund.status = status;
                if decided {
                    refund.decided_at = Some(at);
                }
                if status == RequestStatus::Approved {
                    refund.approved_at = Some(at);
                }
                let amount = refund.amount;
                self.record(LedgerEntryType::Refund, LedgerStatus::Refund(status), amount, at);
            }
            RequestKind::Exchange => {
                let exchange = self.exchange_mut(exchange_id)?;
                exchange.status = status;
                if decided {
                    exchange.decided_at = Some(at);
                }
                self.record(LedgerEntryType::Exchange, LedgerStatus::Exchange(status), Decimal::ZERO, at);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    const AGGREGATE_TYPE: &'static str = "order";

    fn apply_first_event(event: &OrderEvent) -> Result<Self, OrderError> {
        match event {
            OrderEvent::Placed { snapshot, at } => {
                let snapshot = snapshot.as_ref().clone();
                let mut order = Self {
                    id: snapshot.id,
                    version: 0,
                    order_id: snapshot.order_id,
                    order_number: snapshot.order_number,
                    user_id: snapshot.user_id,
                    partner_id: snapshot.partner_id,
                    business_id: snapshot.business_id,
                    business_type: snapshot.business_type,
                    items: snapshot.items,
                    totals: snapshot.totals,
                    commission_rate: snapshot.commission_rate,
                    status: OrderStatus::Pending,
                    payment_method: snapshot.payment_method,
                    note: snapshot.note,
                    delivery_address: snapshot.delivery_address,
                    transaction_history: Vec::new(),
                    refund: None,
                    exchanges: Vec::new(),
                    cancellation_reason: None,
                    created_at: *at,
                    updated_at: *at,
                };
                let total = order.totals.total_price;
                order.record(
                    LedgerEntryType::Placed,
                    LedgerStatus::Order(OrderStatus::Pending),
                    total,
                    *at,
                );
                Ok(order)
            }
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &OrderEvent) -> Result<(), OrderError> {
        let at = event.at();
        self.updated_at = at;
        let total = self.totals.total_price;

        match event {
            OrderEvent::Placed { .. } => {}
            OrderEvent::StatusChanged { to, .. } => {
                self.status = *to;
                self.record(LedgerEntryType::StatusChange, LedgerStatus::Order(*to), total, at);
            }
            OrderEvent::Cancelled { reason, .. } => {
                self.status = OrderStatus::Cancelled;
                self.cancellation_reason = reason.clone();
                self.record(
                    LedgerEntryType::StatusChange,
                    LedgerStatus::Order(OrderStatus::Cancelled),
                    total,
                    at,
                );
            }
            OrderEvent::RefundRequested {
                line_ids,
                reason,
                amount,
                bank_details,
                ..
            } => {
                self.refund = Some(RefundDetails {
                    line_ids: line_ids.clone(),
                    reason: reason.clone(),
                    status: RequestStatus::PendingPartner,
                    requested_at: at,
                    approved_at: None,
                    decided_at: None,
                    amount: *amount,
                    bank_details: bank_details.clone(),
                });
                self.record(
                    LedgerEntryType::Refund,
                    LedgerStatus::Refund(RequestStatus::PendingPartner),
                    *amount,
                    at,
                );
            }
            OrderEvent::ExchangeRequested {
                exchange_id,
                line_ids,
                reason,
                replacement_item_id,
                ..
            } => {
                self.exchanges.push(ExchangeDetails {
                    exchange_id: *exchange_id,
                    line_ids: line_ids.clone(),
                    reason: reason.clone(),
                    status: RequestStatus::PendingPartner,
                    requested_at: at,
                    replacement_item_id: *replacement_item_id,
                    decided_at: None,
                });
                self.record(
                    LedgerEntryType::Exchange,
                    LedgerStatus::Exchange(RequestStatus::PendingPartner),
                    Decimal::ZERO,
                    at,
                );
            }
            OrderEvent::RequestEscalated { kind, exchange_id, .. } => {
                self.set_request_status(*kind, *exchange_id, RequestStatus::PendingAdmin, at)?;
            }
            OrderEvent::RequestDecided {
                kind,
                exchange_id,
                outcome,
                ..
            } => {
                self.set_request_status(*kind, *exchange_id, *outcome, at)?;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        match command {
            OrderCommand::ChangeStatus { to, by, now } => {
                if !self.may_fulfil(*by) {
                    return Err(OrderError::Unauthorized);
                }
                if self.status.is_terminal() {
                    return Err(OrderError::TerminalState(self.status));
                }
                if *to == OrderStatus::Cancelled {
                    return self.cancel(None, *by, *now);
                }
                if !self.status.can_transition(*to) {
                    return Err(OrderError::InvalidTransition {
                        from: self.status,
                        to: *to,
                    });
                }
                Ok(vec![OrderEvent::StatusChanged {
                    from: self.status,
                    to: *to,
                    by: *by,
                    at: *now,
                }])
            }

            OrderCommand::Respond {
                partner_id,
                accept,
                now,
            } => {
                if *partner_id != self.partner_id {
                    return Err(OrderError::Unauthorized);
                }
                if self.status.is_terminal() {
                    return Err(OrderError::TerminalState(self.status));
                }
                if self.status != OrderStatus::Pending {
                    return Err(OrderError::NotPending(self.status));
                }
                let to = if *accept {
                    OrderStatus::Accepted
                } else {
                    OrderStatus::Rejected
                };
                Ok(vec![OrderEvent::StatusChanged {
                    from: self.status,
                    to,
                    by: Actor::Partner(*partner_id),
                    at: *now,
                }])
            }

            OrderCommand::Cancel { reason, by, now } => self.cancel(reason.clone(), *by, *now),

            OrderCommand::RequestRefund {
                user_id,
                line_ids,
                reason,
                bank_details,
                now,
            } => {
                self.ensure_returns_open(*user_id)?;
                if let Some(refund) = &self.refund {
                    if refund.status.is_open() || refund.status == RequestStatus::Approved {
                        return Err(OrderError::AlreadyPending(RequestKind::Refund));
                    }
                }
                let lines = self.returnable_lines(line_ids)?;
                let amount = lines
                    .iter()
                    .map(|l| l.amounts.line_price + l.amounts.tax)
                    .sum();

                Ok(vec![OrderEvent::RefundRequested {
                    line_ids: lines.iter().map(|l| l.line_id).collect(),
                    reason: reason.clone(),
                    amount,
                    bank_details: bank_details.clone(),
                    at: *now,
                }])
            }

            OrderCommand::RequestExchange {
                user_id,
                line_ids,
                reason,
                replacement_item_id,
                now,
            } => {
                self.ensure_returns_open(*user_id)?;
                if self.open_exchange().is_some() {
                    return Err(OrderError::AlreadyPending(RequestKind::Exchange));
                }
                let lines = self.returnable_lines(line_ids)?;
                let refunded = self.approved_refund_lines();
                if let Some(line) = lines.iter().find(|l| refunded.contains(&l.line_id)) {
                    return Err(OrderError::LineAlreadyRefunded(line.line_id));
                }

                Ok(vec![OrderEvent::ExchangeRequested {
                    exchange_id: Uuid::new_v4(),
                    line_ids: lines.iter().map(|l| l.line_id).collect(),
                    reason: reason.clone(),
                    replacement_item_id: *replacement_item_id,
                    at: *now,
                }])
            }

            OrderCommand::Decide {
                kind,
                decision,
                by,
                now,
            } => {
                let (status, exchange_id) = match kind {
                    RequestKind::Refund => self.open_refund().map(|r| (r.status, None)),
                    RequestKind::Exchange => self
                        .open_exchange()
                        .map(|e| (e.status, Some(e.exchange_id))),
                }
                .ok_or(OrderError::NoOpenRequest(*kind))?;

                if !self.may_decide(status, *by) {
                    return Err(OrderError::Unauthorized);
                }
                let outcome = decision.outcome();
                debug_assert!(status.can_transition(outcome));

                Ok(vec![OrderEvent::RequestDecided {
                    kind: *kind,
                    exchange_id,
                    outcome,
                    by: *by,
                    at: *now,
                }])
            }

            OrderCommand::Escalate { threshold, now } => Ok(self
                .stale_requests(*now, *threshold)
                .into_iter()
                .map(|(kind, exchange_id)| OrderEvent::RequestEscalated {
                    kind,
                    exchange_id,
                    at: *now,
                })
                .collect()),
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

// ============================================================================
// Unit Tests
// ============================================================================
