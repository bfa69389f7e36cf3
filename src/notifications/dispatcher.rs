use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Mailer, Notification, Notifier};
use crate::metrics::Metrics;
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, RetryConfig, RetryResult,
};

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Bounded queue -> single worker task -> Mailer, with retry/backoff for
// transient failures inside a circuit breaker. Anything that still fails
// lands in a bounded in-memory dead-letter list for inspection.
//
// A full queue drops the notification (logged and counted) rather than
// blocking the caller.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    pub dead_letter_capacity: usize,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            dead_letter_capacity: 256,
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub notification: Notification,
    pub error: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub delivered: u64,
    pub dead_lettered: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    dead_lettered: AtomicU64,
    dropped: AtomicU64,
}

pub struct NotificationDispatcher {
    sender: Mutex<Option<mpsc::Sender<Notification>>>,
    dead_letters: Arc<Mutex<VecDeque<DeadLetter>>>,
    counters: Arc<Counters>,
    metrics: Arc<Metrics>,
}

struct Worker {
    mailer: Arc<dyn Mailer>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    dead_letters: Arc<Mutex<VecDeque<DeadLetter>>>,
    dead_letter_capacity: usize,
    counters: Arc<Counters>,
    metrics: Arc<Metrics>,
}

impl NotificationDispatcher {
    /// Spawn the delivery worker. The handle finishes once `shutdown` has
    /// been called and the queue is drained.
    pub fn start(
        mailer: Arc<dyn Mailer>,
        config: DispatcherConfig,
        metrics: Arc<Metrics>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let dead_letters = Arc::new(Mutex::new(VecDeque::new()));
        let counters = Arc::new(Counters::default());

        let breaker_metrics = metrics.clone();
        let breaker = CircuitBreaker::new("mailer", config.breaker.clone()).with_transition_hook(
            move |from, to| {
                breaker_metrics.record_circuit_breaker_transition(from.as_str(), to.as_str(), to.as_gauge());
            },
        );

        let worker = Worker {
            mailer,
            breaker,
            retry: config.retry.clone(),
            dead_letters: dead_letters.clone(),
            dead_letter_capacity: config.dead_letter_capacity,
            counters: counters.clone(),
            metrics: metrics.clone(),
        };
        let handle = tokio::spawn(worker.run(receiver));

        tracing::info!(
            queue_capacity = config.queue_capacity,
            dead_letter_capacity = config.dead_letter_capacity,
            "Notification dispatcher started"
        );

        let dispatcher = Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            dead_letters,
            counters,
            metrics,
        });
        (dispatcher, handle)
    }

    /// Stop accepting notifications; queued ones are still delivered.
    pub fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if sender.is_some() {
            tracing::info!("Notification dispatcher closing queue");
        }
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        match self.dead_letters.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dead_lettered: self.counters.dead_lettered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    fn drop_notification(&self, notification: &Notification, why: &str) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .record_notification(notification.topic.as_str(), "dropped");
        tracing::warn!(
            notification_id = %notification.id,
            topic = notification.topic.as_str(),
            reason = why,
            "Notification dropped"
        );
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, notification: Notification) {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let Some(sender) = sender else {
            self.drop_notification(&notification, "dispatcher stopped");
            return;
        };

        match sender.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => self.drop_notification(&n, "queue full"),
            Err(mpsc::error::TrySendError::Closed(n)) => self.drop_notification(&n, "worker gone"),
        }
    }
}

impl Worker {
    async fn run(self, mut receiver: mpsc::Receiver<Notification>) {
        while let Some(notification) = receiver.recv().await {
            self.deliver(notification).await;
        }
        tracing::info!("Notification dispatcher drained, stopping");
    }

    async fn deliver(&self, notification: Notification) {
        let topic = notification.topic.as_str();
        let outcome = retry_on_transient(&self.retry, |attempt| {
            if attempt > 1 {
                self.metrics.notification_retries.inc();
            }
            self.breaker.call(self.mailer.send(&notification))
        })
        .await;

        let error = match outcome.result {
            RetryResult::Success(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_notification(topic, "delivered");
                tracing::debug!(
                    notification_id = %notification.id,
                    topic,
                    attempts = outcome.attempts,
                    "Notification delivered"
                );
                return;
            }
            RetryResult::Exhausted(e) | RetryResult::PermanentFailure(e) => e.to_string(),
        };

        tracing::error!(
            notification_id = %notification.id,
            topic,
            attempts = outcome.attempts,
            error = %error,
            "Notification undeliverable, dead-lettering"
        );
        self.counters.dead_lettered.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_notification(topic, "dead_lettered");

        let mut dead_letters = match self.dead_letters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if dead_letters.len() >= self.dead_letter_capacity.max(1) {
            dead_letters.pop_front();
        }
        dead_letters.push_back(DeadLetter {
            notification,
            error,
            attempts: outcome.attempts,
            failed_at: Utc::now(),
        });
        self.metrics.dead_letters.set(dead_letters.len() as i64);
    }
}
