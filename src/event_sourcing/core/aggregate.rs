use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::event::{DomainEvent, EventEnvelope};

// ============================================================================
// Aggregate Root
// ============================================================================
//
// 1. Commands are validated against current state before anything changes
// 2. A command yields events; events are facts and applying them cannot fail
//    for business reasons
// 3. Current state is what you get by folding the events in order
//
// Aggregates are stored as a state document plus the event log, so loading
// does not have to replay; `load_from_events` exists for audits and tests.
//
// ============================================================================

pub trait Aggregate: Sized + Send + Sync + Clone + Serialize + DeserializeOwned + 'static {
    type Event: DomainEvent;
    type Command;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used as the partition key in stores, e.g. "order"
    const AGGREGATE_TYPE: &'static str;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Business rules live here. Must not mutate.
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Number of events applied so far
    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Handle a command and apply the resulting events to `self`.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event)?;
        }
        Ok(events)
    }

    /// Rebuild from an ordered event log.
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> anyhow::Result<Self> {
        let (first, rest) = events
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("No events to load"))?;

        let mut aggregate = Self::apply_first_event(&first.event_data)
            .map_err(|e| anyhow::anyhow!("Failed to apply first event: {}", e))?;
        aggregate.set_version(first.sequence_number);

        for envelope in rest {
            aggregate
                .apply_event(&envelope.event_data)
                .map_err(|e| anyhow::anyhow!("Failed to apply event {}: {}", envelope.sequence_number, e))?;
            aggregate.set_version(envelope.sequence_number);
        }

        Ok(aggregate)
    }
}
