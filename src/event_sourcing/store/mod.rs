// ============================================================================
// Event Sourcing Store
// ============================================================================
//
// Aggregates are persisted as one JSON state document with a version column,
// next to the append-only log of the events that produced it. Writes carry
// the version the writer loaded; a mismatch is a concurrency conflict.
//
// ============================================================================

pub mod memory;
pub mod repository;
pub mod scylla_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Classify, ErrorKind};
use crate::event_sourcing::core::{Aggregate, EventEnvelope};

pub use memory::InMemoryStore;
pub use repository::{CommitContext, Repository};
pub use scylla_store::{connect_session, ScyllaStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("concurrency conflict on {aggregate_id}: expected version {expected}, found {actual}")]
    Conflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Infrastructure,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            StoreError::Conflict { .. } => "CONCURRENCY_CONFLICT",
            StoreError::Serialization(_) => "SERIALIZATION_FAILED",
            StoreError::Backend(_) => "STORE_UNAVAILABLE",
        }
    }
}

#[async_trait]
pub trait AggregateStore<A: Aggregate>: Send + Sync {
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<A>, StoreError>;

    /// Persist `aggregate` (already at its new version) and append `events`.
    /// Fails with `StoreError::Conflict` unless the stored version equals
    /// `expected_version` (0 when the aggregate is new).
    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[EventEnvelope<A::Event>],
    ) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<A>, StoreError>;
}
