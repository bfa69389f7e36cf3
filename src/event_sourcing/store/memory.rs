use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AggregateStore, StoreError};
use crate::event_sourcing::core::{Aggregate, EventEnvelope};

struct Entry<A: Aggregate> {
    state: A,
    events: Vec<EventEnvelope<A::Event>>,
}

/// Process-local store. Also the backend the test suite runs against.
pub struct InMemoryStore<A: Aggregate> {
    entries: RwLock<HashMap<Uuid, Entry<A>>>,
}

impl<A: Aggregate> InMemoryStore<A> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Full event log for one aggregate, oldest first.
    pub async fn events(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<A::Event>> {
        self.entries
            .read()
            .await
            .get(&aggregate_id)
            .map(|entry| entry.events.clone())
            .unwrap_or_default()
    }

    /// Rebuild an aggregate from its log instead of the stored document.
    pub async fn replay(&self, aggregate_id: Uuid) -> anyhow::Result<Option<A>> {
        let events = self.events(aggregate_id).await;
        if events.is_empty() {
            return Ok(None);
        }
        A::load_from_events(&events).map(Some)
    }
}

impl<A: Aggregate> Default for InMemoryStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: Aggregate> AggregateStore<A> for InMemoryStore<A> {
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<A>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&aggregate_id)
            .map(|entry| entry.state.clone()))
    }

    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[EventEnvelope<A::Event>],
    ) -> Result<(), StoreError> {
        let aggregate_id = aggregate.aggregate_id();
        let mut entries = self.entries.write().await;

        let actual = entries.get(&aggregate_id).map(|e| e.state.version()).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::Conflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let entry = entries.entry(aggregate_id).or_insert_with(|| Entry {
            state: aggregate.clone(),
            events: Vec::new(),
        });
        entry.state = aggregate.clone();
        entry.events.extend(events.iter().cloned());

        tracing::debug!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            version = aggregate.version(),
            event_count = events.len(),
            "Saved aggregate"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<A>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .map(|entry| entry.state.clone())
            .collect())
    }
}
