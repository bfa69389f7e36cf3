use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Event Envelope
// ============================================================================

/// A domain event plus the metadata needed to store and trace it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub event_type: String,
    pub event_data: E,
    /// Groups events caused by one request, across aggregates
    pub correlation_id: Uuid,
    /// Who triggered it; None for the scheduler
    pub actor_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_data,
            correlation_id,
            actor_id: None,
            timestamp,
        }
    }

    pub fn with_actor(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Variant name recorded next to the payload, e.g. "OrderPlaced"
    fn event_type(&self) -> &'static str;
}

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    enum TestEvent {
        Happened { data: String },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestHappened"
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let actor = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            TestEvent::Happened { data: "x".into() },
            correlation_id,
            Utc::now(),
        )
        .with_actor(Some(actor));

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestHappened");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.actor_id, Some(actor));
    }

    #[test]
    fn test_event_serialization() {
        let json = serialize_event(&TestEvent::Happened { data: "payload".into() }).unwrap();
        assert!(json.contains("payload"));
    }
}
