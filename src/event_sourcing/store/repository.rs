use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::{AggregateStore, StoreError};
use crate::event_sourcing::core::{Aggregate, EventEnvelope};
use crate::utils::KeyedLocks;

// ============================================================================
// Repository
// ============================================================================
//
// Orchestrates: lock -> load -> command -> events -> envelopes -> store.
// Services take the aggregate lock first and hold it until `commit` returns,
// so guards are evaluated against the state that gets persisted.
//
// ============================================================================

/// Metadata stamped on every envelope of one commit.
#[derive(Debug, Clone, Copy)]
pub struct CommitContext {
    pub correlation_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl CommitContext {
    pub fn new(actor_id: Option<Uuid>, at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            actor_id,
            at,
        }
    }
}

pub struct Repository<A: Aggregate> {
    store: Arc<dyn AggregateStore<A>>,
    locks: KeyedLocks<Uuid>,
}

impl<A: Aggregate> Repository<A> {
    pub fn new(store: Arc<dyn AggregateStore<A>>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn lock(&self, aggregate_id: Uuid) -> OwnedMutexGuard<()> {
        self.locks.acquire(&aggregate_id).await
    }

    pub async fn load(&self, aggregate_id: Uuid) -> Result<Option<A>, StoreError> {
        self.store.load(aggregate_id).await
    }

    pub async fn list(&self) -> Result<Vec<A>, StoreError> {
        self.store.list().await
    }

    /// Persist events already applied to `aggregate`. The aggregate's
    /// version is the one it was loaded at; on success it is bumped by the
    /// number of events.
    pub async fn commit(
        &self,
        aggregate: &mut A,
        events: Vec<A::Event>,
        ctx: &CommitContext,
    ) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let aggregate_id = aggregate.aggregate_id();
        let expected_version = aggregate.version();

        let envelopes: Vec<EventEnvelope<A::Event>> = events
            .into_iter()
            .zip(expected_version + 1..)
            .map(|(event, seq)| {
                EventEnvelope::new(aggregate_id, seq, event, ctx.correlation_id, ctx.at)
                    .with_actor(ctx.actor_id)
            })
            .collect();

        let new_version = expected_version + envelopes.len() as i64;
        aggregate.set_version(new_version);

        if let Err(err) = self.store.save(aggregate, expected_version, &envelopes).await {
            aggregate.set_version(expected_version);
            tracing::error!(
                aggregate_type = A::AGGREGATE_TYPE,
                aggregate_id = %aggregate_id,
                error = %err,
                "Failed to persist aggregate"
            );
            return Err(err);
        }

        tracing::debug!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            new_version,
            correlation_id = %ctx.correlation_id,
            "Committed events"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::DomainEvent;
    use crate::event_sourcing::store::InMemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tally {
        id: Uuid,
        version: i64,
        total: u32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TallyEvent {
        Started { id: Uuid },
        Added { by: u32 },
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TallyEvent::Started { .. } => "TallyStarted",
                TallyEvent::Added { .. } => "TallyAdded",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("tally error")]
    struct TallyError;

    impl Aggregate for Tally {
        type Event = TallyEvent;
        type Command = u32;
        type Error = TallyError;

        const AGGREGATE_TYPE: &'static str = "tally";

        fn apply_first_event(event: &TallyEvent) -> Result<Self, TallyError> {
            match event {
                TallyEvent::Started { id } => Ok(Self { id: *id, version: 0, total: 0 }),
                _ => Err(TallyError),
            }
        }

        fn apply_event(&mut self, event: &TallyEvent) -> Result<(), TallyError> {
            if let TallyEvent::Added { by } = event {
                self.total += by;
            }
            Ok(())
        }

        fn handle_command(&self, by: &u32) -> Result<Vec<TallyEvent>, TallyError> {
            Ok(vec![TallyEvent::Added { by: *by }])
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

    fn ctx() -> CommitContext {
        CommitContext::new(None, Utc::now())
    }

    async fn started(repo: &Repository<Tally>) -> Tally {
        let id = Uuid::new_v4();
        let first = TallyEvent::Started { id };
        let mut tally = Tally::apply_first_event(&first).unwrap();
        repo.commit(&mut tally, vec![first], &ctx()).await.unwrap();
        tally
    }

    #[tokio::test]
    async fn test_commit_assigns_sequence_numbers() {
        let store = Arc::new(InMemoryStore::<Tally>::new());
        let repo = Repository::new(store.clone());
        let mut tally = started(&repo).await;

        let events = tally.execute(&5).unwrap();
        repo.commit(&mut tally, events, &ctx()).await.unwrap();

        assert_eq!(tally.version, 2);
        let log = store.events(tally.id).await;
        let seqs: Vec<i64> = log.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(log[1].event_type, "TallyAdded");
    }

    #[tokio::test]
    async fn test_stale_writer_gets_conflict() {
        let store = Arc::new(InMemoryStore::<Tally>::new());
        let repo = Repository::new(store.clone());
        let tally = started(&repo).await;

        let mut first = tally.clone();
        let mut second = tally.clone();
        let events = first.execute(&1).unwrap();
        repo.commit(&mut first, events, &ctx()).await.unwrap();

        let events = second.execute(&2).unwrap();
        let err = repo.commit(&mut second, events, &ctx()).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { expected: 1, actual: 2, .. }));
        assert_eq!(second.version, 1);
    }

    #[tokio::test]
    async fn test_replay_matches_stored_state() {
        let store = Arc::new(InMemoryStore::<Tally>::new());
        let repo = Repository::new(store.clone());
        let mut tally = started(&repo).await;
        for by in [3, 4] {
            let events = tally.execute(&by).unwrap();
            repo.commit(&mut tally, events, &ctx()).await.unwrap();
        }

        let stored = repo.load(tally.id).await.unwrap().unwrap();
        let replayed = store.replay(tally.id).await.unwrap().unwrap();

        assert_eq!(stored.total, 7);
        assert_eq!(replayed.total, stored.total);
        assert_eq!(replayed.version, stored.version);
    }
}
