use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::serialize::row::SerializeRow;
use scylla::statement::batch::Batch;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use super::{AggregateStore, StoreError};
use crate::event_sourcing::core::{serialize_event, Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// ScyllaDB Store
// ============================================================================
//
// Tables:
// - aggregates: one row per aggregate, the JSON state document + version
// - aggregate_events: the append-only envelope log
//
// The version check is read-then-write; writers of the same aggregate are
// already serialized by the repository's per-aggregate lock. New events and
// the state row go out in one logged batch.
//
// ============================================================================

const CREATE_AGGREGATES: &str = "CREATE TABLE IF NOT EXISTS aggregates (
    aggregate_type text,
    aggregate_id uuid,
    version bigint,
    state text,
    updated_at timestamp,
    PRIMARY KEY ((aggregate_type), aggregate_id)
)";

const CREATE_AGGREGATE_EVENTS: &str = "CREATE TABLE IF NOT EXISTS aggregate_events (
    aggregate_type text,
    aggregate_id uuid,
    sequence_number bigint,
    event_id uuid,
    event_type text,
    event_data text,
    correlation_id uuid,
    actor_id uuid,
    timestamp timestamp,
    PRIMARY KEY ((aggregate_type, aggregate_id), sequence_number)
)";

/// Connect, create the keyspace if needed and make sure both tables exist.
pub async fn connect_session(nodes: &[String], keyspace: &str) -> anyhow::Result<Arc<Session>> {
    tracing::info!(nodes = ?nodes, keyspace, "Connecting to ScyllaDB");

    let session: Session = SessionBuilder::new().known_nodes(nodes).build().await?;

    let create_keyspace = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
         {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
        keyspace
    );
    session.query_unpaged(create_keyspace.as_str(), &[]).await?;
    session.use_keyspace(keyspace, false).await?;

    session.query_unpaged(CREATE_AGGREGATES, &[]).await?;
    session.query_unpaged(CREATE_AGGREGATE_EVENTS, &[]).await?;

    Ok(Arc::new(session))
}

const INSERT_EVENT: &str = "INSERT INTO aggregate_events (
    aggregate_type, aggregate_id, sequence_number, event_id, event_type,
    event_data, correlation_id, actor_id, timestamp
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPSERT_STATE: &str = "INSERT INTO aggregates (aggregate_type, aggregate_id, version, state, updated_at)
    VALUES (?, ?, ?, ?, ?)";

/// Bound values for one `INSERT_EVENT`.
type EventRow = (
    &'static str,
    Uuid,
    i64,
    Uuid,
    String,
    String,
    Uuid,
    Option<Uuid>,
    DateTime<Utc>,
);

/// Serialize envelopes into event rows. Sequence numbers must continue
/// right after `expected_version` without gaps, so a batch can never land
/// on rows an earlier commit already wrote.
fn event_rows<E: DomainEvent>(
    aggregate_type: &'static str,
    expected_version: i64,
    events: &[EventEnvelope<E>],
) -> Result<Vec<EventRow>, StoreError> {
    events
        .iter()
        .zip(expected_version + 1..)
        .map(|(envelope, sequence)| {
            if envelope.sequence_number != sequence {
                return Err(StoreError::Conflict {
                    aggregate_id: envelope.aggregate_id,
                    expected: sequence,
                    actual: envelope.sequence_number,
                });
            }
            Ok((
                aggregate_type,
                envelope.aggregate_id,
                envelope.sequence_number,
                envelope.event_id,
                envelope.event_type.clone(),
                serialize_event(&envelope.event_data)?,
                envelope.correlation_id,
                envelope.actor_id,
                envelope.timestamp,
            ))
        })
        .collect()
}

fn backend<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(anyhow::Error::new(err))
}

pub struct ScyllaStore<A: Aggregate> {
    session: Arc<Session>,
    _phantom: PhantomData<A>,
}

impl<A: Aggregate> ScyllaStore<A> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _phantom: PhantomData,
        }
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let rows = self
            .session
            .query_unpaged(
                "SELECT version FROM aggregates WHERE aggregate_type = ? AND aggregate_id = ?",
                (A::AGGREGATE_TYPE, aggregate_id),
            )
            .await
            .map_err(backend)?
            .into_rows_result()
            .map_err(backend)?;

        let row = rows.maybe_first_row::<(i64,)>().map_err(backend)?;
        Ok(row.map(|(version,)| version).unwrap_or(0))
    }
}

#[async_trait]
impl<A: Aggregate> AggregateStore<A> for ScyllaStore<A> {
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<A>, StoreError> {
        let rows = self
            .session
            .query_unpaged(
                "SELECT state FROM aggregates WHERE aggregate_type = ? AND aggregate_id = ?",
                (A::AGGREGATE_TYPE, aggregate_id),
            )
            .await
            .map_err(backend)?
            .into_rows_result()
            .map_err(backend)?;

        match rows.maybe_first_row::<(String,)>().map_err(backend)? {
            Some((state,)) => Ok(Some(serde_json::from_str(&state)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[EventEnvelope<A::Event>],
    ) -> Result<(), StoreError> {
        let aggregate_id = aggregate.aggregate_id();

        let actual = self.current_version(aggregate_id).await?;
        if actual != expected_version {
            return Err(StoreError::Conflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let rows = event_rows(A::AGGREGATE_TYPE, expected_version, events)?;
        let state = serde_json::to_string(aggregate)?;
        let updated_at: DateTime<Utc> = Utc::now();

        // Events and the state row land together or not at all
        let mut batch = Batch::default();
        let mut values: Vec<Box<dyn SerializeRow + Send + Sync>> = Vec::with_capacity(rows.len() + 1);
        for row in rows {
            batch.append_statement(INSERT_EVENT);
            values.push(Box::new(row));
        }
        batch.append_statement(UPSERT_STATE);
        values.push(Box::new((
            A::AGGREGATE_TYPE,
            aggregate_id,
            aggregate.version(),
            state,
            updated_at,
        )));

        self.session.batch(&batch, values).await.map_err(backend)?;

        tracing::info!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            new_version = aggregate.version(),
            event_count = events.len(),
            "Saved aggregate to ScyllaDB"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<A>, StoreError> {
        let rows = self
            .session
            .query_unpaged(
                "SELECT state FROM aggregates WHERE aggregate_type = ?",
                (A::AGGREGATE_TYPE,),
            )
            .await
            .map_err(backend)?
            .into_rows_result()
            .map_err(backend)?;

        let mut aggregates = Vec::new();
        for row in rows.rows::<(String,)>().map_err(backend)? {
            let (state,) = row.map_err(backend)?;
            aggregates.push(serde_json::from_str(&state)?);
        }
        Ok(aggregates)
    }
}
