use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::{OrderEvent, OrderSnapshot};
use super::value_objects::{Actor, BankDetails, Decision, OrderStatus, PaymentMethod, RequestKind};
use crate::clock::Clock;
use crate::domain::cart::{Address, Cart, CartCommand, CartOwner, ClearReason};
use crate::domain::catalog::CatalogStore;
use crate::event_sourcing::{Aggregate, CommitContext, Repository};
use crate::metrics::Metrics;
use crate::notifications::{Notification, Notifier, Recipient, Topic};
use crate::utils::{scrambled_code, CodeSequence};

// ============================================================================
// Order Service
// ============================================================================
//
// Every operation follows the same path: lock order -> load -> command ->
// commit -> announce. Announcing (notifications and metrics) happens after
// the commit and can never undo it.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    /// Defaults to the user's own cart
    #[serde(default)]
    pub cart_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRequest {
    pub kind: RequestKind,
    pub line_ids: Vec<Uuid>,
    pub reason: String,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub replacement_item_id: Option<Uuid>,
}

/// Result of one escalation pass over all orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EscalationReport {
    pub scanned: usize,
    pub escalated: usize,
    pub failed: usize,
}

pub struct OrderService {
    orders: Arc<Repository<Order>>,
    carts: Arc<Repository<Cart>>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
    sequence: CodeSequence,
}

impl OrderService {
    /// Continues numbering after the highest order number already stored.
    pub async fn new(
        orders: Arc<Repository<Order>>,
        carts: Arc<Repository<Cart>>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, OrderError> {
        let last = orders
            .list()
            .await?
            .iter()
            .map(|o| o.order_number)
            .max()
            .unwrap_or(0);
        tracing::info!(last_order_number = last, "Order numbering initialised");

        Ok(Self {
            orders,
            carts,
            catalog,
            clock,
            notifier,
            metrics,
            sequence: CodeSequence::starting_after(last),
        })
    }

    /// Snapshot the cart into a new pending order and clear the cart.
    pub async fn create(&self, request: CheckoutRequest) -> Result<Order, OrderError> {
        let cart_id = request.cart_id.unwrap_or(request.user_id);
        let _cart_guard = self.carts.lock(cart_id).await;

        let mut cart = match self.carts.load(cart_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(OrderError::CartEmpty),
        };
        if cart.owner != CartOwner::User(request.user_id) {
            return Err(OrderError::Unauthorized);
        }

        // Single-business carts, so any line names the business
        let business_id = cart.business_id.ok_or(OrderError::CartEmpty)?;
        let business = self
            .catalog
            .business(business_id)
            .await?
            .ok_or(OrderError::BusinessNotFound(business_id))?;

        let now = self.clock.now();
        let order_number = self.sequence.next();
        let snapshot = OrderSnapshot {
            id: Uuid::new_v4(),
            order_id: scrambled_code(order_number),
            order_number,
            user_id: request.user_id,
            partner_id: business.partner_id,
            business_id,
            business_type: business.business_type,
            items: cart.lines.clone(),
            totals: cart.totals.clone(),
            commission_rate: cart.commission_rate,
            payment_method: request.payment_method,
            note: request.note,
            delivery_address: request.delivery_address.or_else(|| cart.delivery_address.clone()),
        };

        let placed = Order::place(snapshot, now)?;
        let mut order = Order::apply_first_event(&placed)?;
        let ctx = CommitContext::new(Some(request.user_id), now);
        self.orders.commit(&mut order, vec![placed.clone()], &ctx).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = order.order_number,
            code = %order.order_id,
            user_id = %order.user_id,
            total = %order.totals.total_price,
            "Order placed"
        );

        // The order stands even if clearing fails; the cart is just stale
        let clear = CartCommand::Clear {
            reason: ClearReason::CheckedOut { order_id: order.id },
            now,
        };
        let cleared = match cart.execute(&clear) {
            Ok(events) => self.carts.commit(&mut cart, events, &ctx).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = cleared {
            tracing::error!(order_id = %order.id, cart_id = %cart_id, error = %error, "Failed to clear cart after checkout");
        }

        self.announce(&order, &[placed]);
        Ok(order)
    }

    /// Partner or admin moves the order along the fulfilment path.
    pub async fn update_status(&self, order_id: Uuid, to: OrderStatus, by: Actor) -> Result<Order, OrderError> {
        let now = self.clock.now();
        self.execute(order_id, by, OrderCommand::ChangeStatus { to, by, now })
            .await
    }

    pub async fn partner_respond(&self, order_id: Uuid, partner_id: Uuid, accept: bool) -> Result<Order, OrderError> {
        let now = self.clock.now();
        self.execute(
            order_id,
            Actor::Partner(partner_id),
            OrderCommand::Respond {
                partner_id,
                accept,
                now,
            },
        )
        .await
    }

    pub async fn cancel(&self, order_id: Uuid, reason: Option<String>, by: Actor) -> Result<Order, OrderError> {
        let now = self.clock.now();
        self.execute(order_id, by, OrderCommand::Cancel { reason, by, now })
            .await
    }

    pub async fn request_refund_or_exchange(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        request: ReturnRequest,
    ) -> Result<Order, OrderError> {
        let now = self.clock.now();
        let command = match request.kind {
            RequestKind::Refund => OrderCommand::RequestRefund {
                user_id,
                line_ids: request.line_ids,
                reason: request.reason,
                bank_details: request.bank_details,
                now,
            },
            RequestKind::Exchange => OrderCommand::RequestExchange {
                user_id,
                line_ids: request.line_ids,
                reason: request.reason,
                replacement_item_id: request.replacement_item_id,
                now,
            },
        };
        self.execute(order_id, Actor::Customer(user_id), command).await
    }

    pub async fn decide(
        &self,
        order_id: Uuid,
        kind: RequestKind,
        decision: Decision,
        by: Actor,
    ) -> Result<Order, OrderError> {
        let now = self.clock.now();
        self.execute(
            order_id,
            by,
            OrderCommand::Decide {
                kind,
                decision,
                by,
                now,
            },
        )
        .await
    }

    /// Move partner-owned requests older than `threshold` to admins. A
    /// failing order is logged and counted; the pass carries on.
    pub async fn escalate_stale(&self, threshold: Duration) -> Result<EscalationReport, OrderError> {
        let now = self.clock.now();
        let orders = self.orders.list().await?;
        let mut report = EscalationReport {
            scanned: orders.len(),
            ..Default::default()
        };

        for candidate in orders.iter().filter(|o| o.escalation_due(now, threshold)) {
            match self.escalate_one(candidate.id, threshold, now).await {
                Ok(count) => report.escalated += count,
                Err(error) => {
                    report.failed += 1;
                    tracing::error!(order_id = %candidate.id, error = %error, "Failed to escalate order");
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            escalated = report.escalated,
            failed = report.failed,
            "Escalation pass finished"
        );
        Ok(report)
    }

    /// Customers see their own orders, partners the ones placed with them.
    pub async fn get(&self, order_id: Uuid, viewer: Actor) -> Result<Order, OrderError> {
        let order = self
            .orders
            .load(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        if !visible_to(&order, viewer) {
            return Err(OrderError::Unauthorized);
        }
        Ok(order)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, OrderError> {
        self.list_where(|o| o.user_id == user_id).await
    }

    pub async fn list_for_business(
        &self,
        business_id: Uuid,
        status: Option<OrderStatus>,
        viewer: Actor,
    ) -> Result<Vec<Order>, OrderError> {
        let business = self
            .catalog
            .business(business_id)
            .await?
            .ok_or(OrderError::BusinessNotFound(business_id))?;
        let allowed = match viewer {
            Actor::Partner(id) => id == business.partner_id,
            Actor::Admin(_) => true,
            Actor::Customer(_) | Actor::Scheduler => false,
        };
        if !allowed {
            return Err(OrderError::Unauthorized);
        }

        self.list_where(|o| o.business_id == business_id && status.map_or(true, |s| o.status == s))
            .await
    }

    /// Orders across every business the partner runs.
    pub async fn list_for_partner(&self, partner_id: Uuid) -> Result<Vec<Order>, OrderError> {
        self.list_where(|o| o.partner_id == partner_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Order>, OrderError> {
        self.list_where(|_| true).await
    }

    async fn list_where<F>(&self, keep: F) -> Result<Vec<Order>, OrderError>
    where
        F: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Order> = self.orders.list().await?.into_iter().filter(|o| keep(o)).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn escalate_one(&self, order_id: Uuid, threshold: Duration, now: DateTime<Utc>) -> Result<usize, OrderError> {
        let _guard = self.orders.lock(order_id).await;
        let mut order = self
            .orders
            .load(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        // Re-checked under the lock; a decision may have landed meanwhile
        let events = order.execute(&OrderCommand::Escalate { threshold, now })?;
        if events.is_empty() {
            return Ok(0);
        }
        let count = events.len();
        self.orders
            .commit(&mut order, events.clone(), &CommitContext::new(None, now))
            .await?;

        tracing::info!(order_id = %order.id, requests = count, "Escalated stalled requests to admin");
        self.announce(&order, &events);
        Ok(count)
    }

    async fn execute(&self, order_id: Uuid, by: Actor, command: OrderCommand) -> Result<Order, OrderError> {
        let _guard = self.orders.lock(order_id).await;

        let mut order = self
            .orders
            .load(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        let events = match order.execute(&command) {
            Ok(events) => events,
            Err(err) => {
                tracing::debug!(
                    order_id = %order_id,
                    status = %order.status,
                    actor = ?by,
                    error = %err,
                    "Order command rejected"
                );
                return Err(err);
            }
        };

        let ctx = CommitContext::new(by.id(), self.clock.now());
        self.orders.commit(&mut order, events.clone(), &ctx).await?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            version = order.version,
            actor = ?by,
            "Order updated"
        );
        self.announce(&order, &events);
        Ok(order)
    }

    fn announce(&self, order: &Order, events: &[OrderEvent]) {
        let code = &order.order_id;
        for event in events {
            match event {
                OrderEvent::Placed { .. } => {
                    self.metrics.record_order_placed(order.business_type.as_str());
                    self.notify(
                        Recipient::User(order.user_id),
                        Topic::OrderPlaced,
                        format!("Order {} placed", code),
                        format!("Your order total is {}.", order.totals.total_price),
                    );
                    self.notify(
                        Recipient::Partner(order.partner_id),
                        Topic::OrderPlaced,
                        format!("New order {}", code),
                        format!("A new order worth {} is waiting for your response.", order.totals.total_price),
                    );
                }
                OrderEvent::StatusChanged { from, to, .. } => {
                    self.metrics.record_transition(from.as_str(), to.as_str());
                    self.notify(
                        Recipient::User(order.user_id),
                        Topic::OrderStatusChanged,
                        format!("Order {} is now {}", code, to),
                        format!("Your order moved from {} to {}.", from, to),
                    );
                }
                OrderEvent::Cancelled { from, reason, by, .. } => {
                    self.metrics
                        .record_transition(from.as_str(), OrderStatus::Cancelled.as_str());
                    let body = match reason {
                        Some(reason) => format!("Order {} was cancelled: {}", code, reason),
                        None => format!("Order {} was cancelled.", code),
                    };
                    let recipient = match by {
                        Actor::Customer(_) => Recipient::Partner(order.partner_id),
                        _ => Recipient::User(order.user_id),
                    };
                    self.notify(recipient, Topic::OrderStatusChanged, format!("Order {} cancelled", code), body);
                }
                OrderEvent::RefundRequested { amount, .. } => {
                    self.metrics.record_return_request(RequestKind::Refund.as_str());
                    self.notify(
                        Recipient::Partner(order.partner_id),
                        Topic::ReturnRequested,
                        format!("Refund requested on order {}", code),
                        format!("The customer asked for a refund of {}.", amount),
                    );
                }
                OrderEvent::ExchangeRequested { .. } => {
                    self.metrics.record_return_request(RequestKind::Exchange.as_str());
                    self.notify(
                        Recipient::Partner(order.partner_id),
                        Topic::ReturnRequested,
                        format!("Exchange requested on order {}", code),
                        "The customer asked for an exchange.".to_string(),
                    );
                }
                OrderEvent::RequestEscalated { kind, .. } => {
                    self.metrics.record_escalation(kind.as_str());
                    self.notify(
                        Recipient::Admins,
                        Topic::ReturnEscalated,
                        format!("{} request on order {} escalated", kind.as_str(), code),
                        "The partner did not respond in time; an admin decision is needed.".to_string(),
                    );
                    self.notify(
                        Recipient::User(order.user_id),
                        Topic::ReturnEscalated,
                        format!("Your {} request is under review", kind.as_str()),
                        "Our support team has taken over your request.".to_string(),
                    );
                }
                OrderEvent::RequestDecided { kind, outcome, .. } => {
                    self.metrics
                        .record_return_decision(kind.as_str(), outcome.as_str());
                    self.notify(
                        Recipient::User(order.user_id),
                        Topic::ReturnDecided,
                        format!("Your {} request was {}", kind.as_str(), outcome.as_str()),
                        format!("Order {}: {} request {}.", code, kind.as_str(), outcome.as_str()),
                    );
                }
            }
        }
    }

    fn notify(&self, recipient: Recipient, topic: Topic, subject: String, body: String) {
        self.notifier
            .notify(Notification::new(recipient, topic, subject, body));
    }
}

fn visible_to(order: &Order, viewer: Actor) -> bool {
    match viewer {
        Actor::Customer(id) => id == order.user_id,
        Actor::Partner(id) => id == order.partner_id,
        Actor::Admin(_) | Actor::Scheduler => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::cart::{AddLineRequest, CartService};
    use crate::domain::catalog::{
        Business, BusinessType, CatalogItem, Category, InMemoryCatalog, ItemKind, SettingsRateProvider, Variant,
    };
    use crate::domain::order::{RequestStatus, LedgerEntryType};
    use crate::event_sourcing::InMemoryStore;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    impl RecordingNotifier {
        fn topics(&self) -> Vec<Topic> {
            self.sent.lock().unwrap().iter().map(|n| n.topic).collect()
        }
    }

    struct Fixture {
        carts: CartService,
        orders: OrderService,
        clock: Arc<FixedClock>,
        notifier: Arc<RecordingNotifier>,
        metrics: Arc<Metrics>,
        partner_id: Uuid,
        shirt_id: Uuid,
    }

    fn address() -> Address {
        Address {
            recipient: "Ada".into(),
            line1: "1 Main St".into(),
            line2: None,
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
            phone: None,
        }
    }

    async fn fixture() -> Fixture {
        let partner_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let category_id = Uuid::new_v4();
        let shirt_id = Uuid::new_v4();

        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.add_partner(partner_id).await;
        catalog
            .put_business(Business {
                id: business_id,
                partner_id,
                name: "Threads".into(),
                business_type: BusinessType::Shop,
                reservations_enabled: false,
                operating_hours: Vec::new(),
            })
            .await;
        catalog
            .put_category(Category {
                id: category_id,
                name: "Apparel".into(),
                tax_rate: Decimal::from(10),
                inherits_tax: false,
                parent_id: None,
            })
            .await;
        catalog
            .put_item(CatalogItem {
                id: shirt_id,
                business_id,
                name: "Shirt".into(),
                kind: ItemKind::Product,
                category_id,
                base_price: Decimal::from(20),
                delivery_charge: Decimal::from(5),
                variants: vec![Variant {
                    size: Some("M".into()),
                    color: Some("blue".into()),
                    price: Decimal::from(25),
                }],
                max_guests: None,
            })
            .await;

        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let notifier = Arc::new(RecordingNotifier::default());
        let metrics = Arc::new(Metrics::new().unwrap());
        let cart_repo = Arc::new(Repository::new(Arc::new(InMemoryStore::<Cart>::new())));
        let order_repo = Arc::new(Repository::new(Arc::new(InMemoryStore::<Order>::new())));

        let carts = CartService::new(
            cart_repo.clone(),
            catalog.clone(),
            Arc::new(SettingsRateProvider::new(Decimal::from(5))),
            clock.clone(),
        );
        let orders = OrderService::new(order_repo, cart_repo, catalog, clock.clone(), notifier.clone(), metrics.clone())
            .await
            .unwrap();

        Fixture {
            carts,
            orders,
            clock,
            notifier,
            metrics,
            partner_id,
            shirt_id,
        }
    }

    async fn place(f: &Fixture, user_id: Uuid) -> Order {
        f.carts
            .add_line(
                &CartOwner::User(user_id),
                AddLineRequest::new(f.shirt_id, 2)
                    .variant(Some("M"), Some("blue"))
                    .deliver_to(address()),
            )
            .await
            .unwrap();
        f.orders
            .create(CheckoutRequest {
                user_id,
                cart_id: None,
                payment_method: PaymentMethod::Card,
                note: None,
                delivery_address: None,
            })
            .await
            .unwrap()
    }

    async fn deliver(f: &Fixture, order_id: Uuid) {
        let partner = Actor::Partner(f.partner_id);
        f.orders.partner_respond(order_id, f.partner_id, true).await.unwrap();
        for to in [OrderStatus::Processing, OrderStatus::OutForDelivery, OrderStatus::Delivered] {
            f.orders.update_status(order_id, to, partner).await.unwrap();
        }
    }

    fn refund_of(order: &Order) -> ReturnRequest {
        ReturnRequest {
            kind: RequestKind::Refund,
            line_ids: vec![order.items[0].line_id],
            reason: "too small".into(),
            bank_details: None,
            replacement_item_id: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_snapshots_cart_and_clears_it() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();
        let order = place(&f, user_id).await;

        // 2 x 25 = 50, tax 5, delivery 5, commission 2.50
        assert_eq!(order.totals.subtotal, Decimal::from(50));
        assert_eq!(order.totals.total_price, Decimal::new(6250, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_number, 1);
        assert_eq!(order.order_id, scrambled_code(1));
        assert_eq!(order.delivery_address, Some(address()));
        assert_eq!(order.transaction_history.len(), 1);
        assert_eq!(order.transaction_history[0].entry_type, LedgerEntryType::Placed);

        let cart = f.carts.get(&CartOwner::User(user_id)).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.totals.total_price, Decimal::ZERO);

        assert_eq!(f.notifier.topics(), vec![Topic::OrderPlaced, Topic::OrderPlaced]);
        assert_eq!(f.metrics.orders_placed.with_label_values(&["shop"]).get(), 1);
    }

    #[tokio::test]
    async fn test_checkout_of_empty_cart_fails() {
        let f = fixture().await;
        let err = f
            .orders
            .create(CheckoutRequest {
                user_id: Uuid::new_v4(),
                cart_id: None,
                payment_method: PaymentMethod::CashOnDelivery,
                note: None,
                delivery_address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::CartEmpty));
    }

    #[tokio::test]
    async fn test_checkout_of_someone_elses_cart_is_refused() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        f.carts
            .add_line(
                &CartOwner::User(owner),
                AddLineRequest::new(f.shirt_id, 1)
                    .variant(Some("M"), Some("blue"))
                    .deliver_to(address()),
            )
            .await
            .unwrap();

        let err = f
            .orders
            .create(CheckoutRequest {
                user_id: Uuid::new_v4(),
                cart_id: Some(owner),
                payment_method: PaymentMethod::Card,
                note: None,
                delivery_address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized));
    }

    #[tokio::test]
    async fn test_order_numbers_are_sequential() {
        let f = fixture().await;
        let first = place(&f, Uuid::new_v4()).await;
        let second = place(&f, Uuid::new_v4()).await;
        assert_eq!(second.order_number, first.order_number + 1);
        assert_ne!(first.order_id, second.order_id);
    }

    #[tokio::test]
    async fn test_status_changes_notify_customer_and_count_transitions() {
        let f = fixture().await;
        let order = place(&f, Uuid::new_v4()).await;
        deliver(&f, order.id).await;

        let order = f.orders.get(order.id, Actor::Partner(f.partner_id)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.transaction_history.len(), 5);
        assert_eq!(
            f.metrics
                .order_transitions
                .with_label_values(&["out_for_delivery", "delivered"])
                .get(),
            1
        );
        let status_notes = f
            .notifier
            .topics()
            .into_iter()
            .filter(|t| *t == Topic::OrderStatusChanged)
            .count();
        assert_eq!(status_notes, 4);
    }

    #[tokio::test]
    async fn test_other_customer_cannot_read_order() {
        let f = fixture().await;
        let order = place(&f, Uuid::new_v4()).await;
        let err = f.orders.get(order.id, Actor::Customer(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized));
    }

    #[tokio::test]
    async fn test_list_for_business_filters_by_status() {
        let f = fixture().await;
        let first = place(&f, Uuid::new_v4()).await;
        let _second = place(&f, Uuid::new_v4()).await;
        f.orders.partner_respond(first.id, f.partner_id, true).await.unwrap();

        let partner = Actor::Partner(f.partner_id);
        let all = f.orders.list_for_business(first.business_id, None, partner).await.unwrap();
        let accepted = f
            .orders
            .list_for_business(first.business_id, Some(OrderStatus::Accepted), partner)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, first.id);

        let err = f
            .orders
            .list_for_business(first.business_id, None, Actor::Partner(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized));
    }

    #[tokio::test]
    async fn test_escalation_pass_hands_stale_refunds_to_admin() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();
        let order = place(&f, user_id).await;
        deliver(&f, order.id).await;
        f.orders
            .request_refund_or_exchange(order.id, user_id, refund_of(&order))
            .await
            .unwrap();

        f.clock.advance(Duration::days(3));
        let report = f.orders.escalate_stale(Duration::days(7)).await.unwrap();
        assert_eq!(report.escalated, 0);

        f.clock.advance(Duration::days(5));
        let report = f.orders.escalate_stale(Duration::days(7)).await.unwrap();
        assert_eq!(report, EscalationReport { scanned: 1, escalated: 1, failed: 0 });

        // Idempotent
        let report = f.orders.escalate_stale(Duration::days(7)).await.unwrap();
        assert_eq!(report.escalated, 0);

        let order = f.orders.get(order.id, Actor::Customer(user_id)).await.unwrap();
        assert_eq!(order.refund.as_ref().unwrap().status, RequestStatus::PendingAdmin);
        assert!(f.notifier.topics().contains(&Topic::ReturnEscalated));
        assert_eq!(f.metrics.escalations.with_label_values(&["refund"]).get(), 1);

        // Partner lost the decision; an admin makes it
        let err = f
            .orders
            .decide(order.id, RequestKind::Refund, Decision::Approve, Actor::Partner(f.partner_id))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized));
        let order = f
            .orders
            .decide(order.id, RequestKind::Refund, Decision::Approve, Actor::Admin(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(order.refund.as_ref().unwrap().status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let f = fixture().await;
        let err = f
            .orders
            .cancel(Uuid::new_v4(), None, Actor::Admin(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }
}
