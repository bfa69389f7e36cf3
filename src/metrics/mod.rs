mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// - Order lifecycle: placements, status transitions, refund/exchange traffic
// - Escalation sweeps: runs, duration, requests escalated
// - Reservations by outcome
// - Notification delivery: outcomes, retries, dead letters, circuit breaker
//
// Everything is registered on one Registry and scraped via /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Orders
    pub orders_placed: IntCounterVec,
    pub order_transitions: IntCounterVec,
    pub return_requests: IntCounterVec,
    pub return_decisions: IntCounterVec,

    // Escalation
    pub escalations: IntCounterVec,
    pub sweep_runs: IntCounterVec,
    pub sweep_duration: Histogram,

    // Reservations
    pub reservations: IntCounterVec,

    // Notifications
    pub notifications: IntCounterVec,
    pub notification_retries: IntCounter,
    pub dead_letters: IntGauge,
    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_placed = IntCounterVec::new(
            Opts::new("orders_placed_total", "Orders created from a cart checkout"),
            &["business_type"],
        )?;
        registry.register(Box::new(orders_placed.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let return_requests = IntCounterVec::new(
            Opts::new("return_requests_total", "Refund and exchange requests filed"),
            &["kind"],
        )?;
        registry.register(Box::new(return_requests.clone()))?;

        let return_decisions = IntCounterVec::new(
            Opts::new("return_decisions_total", "Refund and exchange decisions"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(return_decisions.clone()))?;

        let escalations = IntCounterVec::new(
            Opts::new("return_escalations_total", "Requests escalated from partner to admin"),
            &["kind"],
        )?;
        registry.register(Box::new(escalations.clone()))?;

        let sweep_runs = IntCounterVec::new(
            Opts::new("escalation_sweeps_total", "Escalation sweep runs"),
            &["outcome"],
        )?;
        registry.register(Box::new(sweep_runs.clone()))?;

        let sweep_duration = Histogram::with_opts(
            HistogramOpts::new("escalation_sweep_duration_seconds", "Escalation sweep duration")
                .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(sweep_duration.clone()))?;

        let reservations = IntCounterVec::new(
            Opts::new("reservations_total", "Reservation requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(reservations.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications by topic and delivery outcome"),
            &["topic", "outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let notification_retries = IntCounter::new(
            "notification_retries_total",
            "Delivery attempts beyond the first",
        )?;
        registry.register(Box::new(notification_retries.clone()))?;

        let dead_letters = IntGauge::new(
            "notification_dead_letters",
            "Undeliverable notifications currently held",
        )?;
        registry.register(Box::new(dead_letters.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "mailer_circuit_breaker_state",
            "Mailer circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("mailer_circuit_breaker_transitions_total", "Mailer circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            order_transitions,
            return_requests,
            return_decisions,
            escalations,
            sweep_runs,
            sweep_duration,
            reservations,
            notifications,
            notification_retries,
            dead_letters,
            circuit_breaker_state,
            circuit_breaker_transitions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_placed(&self, business_type: &str) {
        self.orders_placed.with_label_values(&[business_type]).inc();
    }

    pub fn record_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_return_request(&self, kind: &str) {
        self.return_requests.with_label_values(&[kind]).inc();
    }

    pub fn record_return_decision(&self, kind: &str, outcome: &str) {
        self.return_decisions.with_label_values(&[kind, outcome]).inc();
    }

    pub fn record_escalation(&self, kind: &str) {
        self.escalations.with_label_values(&[kind]).inc();
    }

    pub fn record_sweep(&self, outcome: &str, duration_secs: f64) {
        self.sweep_runs.with_label_values(&[outcome]).inc();
        self.sweep_duration.observe(duration_secs);
    }

    pub fn record_reservation(&self, outcome: &str) {
        self.reservations.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification(&self, topic: &str, outcome: &str) {
        self.notifications.with_label_values(&[topic, outcome]).inc();
    }

    pub fn record_circuit_breaker_transition(&self, from_state: &str, to_state: &str, gauge: i64) {
        self.circuit_breaker_transitions
            .with_label_values(&[from_state, to_state])
            .inc();
        self.circuit_breaker_state.set(gauge);
    }
}
