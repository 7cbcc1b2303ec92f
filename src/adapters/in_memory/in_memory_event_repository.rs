// In memory implementation of the EventRepository port.
//
// Purpose
// - Support tests and local development without a database.
//
// Responsibilities
// - Keep the append log and its two uniqueness indexes per store instance.
// - Evaluate the idempotency check, the conflict check and the insert as one
//   critical section: a single lock acquisition with no await point inside.

use crate::core::event::StoredEvent;
use crate::core::ports::{ConcurrencyError, EventRepository, EventStoreError};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct Indexes {
    /// Append-order log; grows indefinitely, acceptable for this adapter's role.
    log: Vec<StoredEvent>,
    /// `(aggregate_id, version)` pairs already committed.
    versions: HashSet<(String, i64)>,
    /// Idempotency keys already committed.
    idempotency_keys: HashSet<String>,
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    inner: Mutex<Indexes>,
    offline: bool,
    delay_append: Option<Duration>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test knob: make every operation fail with a backend error.
    pub fn toggle_offline(&mut self) {
        self.offline = !self.offline;
    }

    /// Test knob: widen race windows. The sleep happens before the lock is
    /// taken, never inside the critical section.
    pub fn set_delay_append_ms(&mut self, ms: u64) {
        self.delay_append = Some(Duration::from_millis(ms));
    }

    fn ensure_online(&self) -> Result<(), EventStoreError> {
        if self.offline {
            return Err(EventStoreError::Backend("event store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn append(&self, event: StoredEvent) -> Result<(), EventStoreError> {
        if let Some(delay) = self.delay_append {
            tokio::time::sleep(delay).await;
        }
        self.ensure_online()?;

        let mut indexes = self.inner.lock().await;

        // Idempotency first: a retried command is a success, never a conflict.
        if indexes
            .idempotency_keys
            .contains(&event.metadata.idempotency_key)
        {
            tracing::debug!(
                idempotency_key = %event.metadata.idempotency_key,
                event_type = %event.event_type,
                "duplicate idempotency key, skipping append"
            );
            return Ok(());
        }

        if let (Some(aggregate_id), Some(version)) = (&event.aggregate_id, event.version) {
            if indexes.versions.contains(&(aggregate_id.clone(), version)) {
                tracing::warn!(
                    aggregate_id = %aggregate_id,
                    version,
                    "optimistic lock conflict"
                );
                return Err(ConcurrencyError {
                    aggregate_id: aggregate_id.clone(),
                    expected_version: version,
                }
                .into());
            }
            indexes.versions.insert((aggregate_id.clone(), version));
        }

        indexes
            .idempotency_keys
            .insert(event.metadata.idempotency_key.clone());
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            aggregate_id = event.aggregate_id.as_deref(),
            version = event.version,
            "event appended"
        );
        indexes.log.push(event);
        Ok(())
    }

    async fn get_by_aggregate_id(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        let indexes = self.inner.lock().await;
        let mut events: Vec<StoredEvent> = indexes
            .log
            .iter()
            .filter(|e| e.aggregate_id.as_deref() == Some(aggregate_id))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_all(&self) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        let indexes = self.inner.lock().await;
        Ok(indexes.log.clone())
    }
}

#[cfg(test)]
mod in_memory_event_repository_tests {
    use super::*;
    use crate::core::event::EventMetadata;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    fn event(
        aggregate_id: Option<&str>,
        version: Option<i64>,
        idempotency_key: &str,
        payload: serde_json::Value,
    ) -> StoredEvent {
        StoredEvent {
            id: Uuid::now_v7(),
            event_type: "TestFact".to_string(),
            aggregate_id: aggregate_id.map(str::to_string),
            aggregate_type: aggregate_id.map(|_| "Test".to_string()),
            version,
            payload,
            metadata: EventMetadata {
                correlation_id: "corr-0001".to_string(),
                causation_id: None,
                idempotency_key: idempotency_key.to_string(),
                timestamp: 1_700_000_000_000,
                source: "tests".to_string(),
            },
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_append_and_read_back_in_version_order() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-1"), Some(2), "k-2", json!({})))
            .await
            .expect("append v2");
        repo.append(event(Some("agg-1"), Some(1), "k-1", json!({})))
            .await
            .expect("append v1");
        let events = repo.get_by_aggregate_id("agg-1").await.expect("read");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].version, Some(1));
        assert_eq!(events[1].version, Some(2));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_reused_version_for_the_same_aggregate() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-2"), Some(1), "k-1", json!({})))
            .await
            .expect("first append");
        let result = repo
            .append(event(Some("agg-2"), Some(1), "k-2", json!({})))
            .await;
        match result {
            Err(EventStoreError::Conflict(err)) => {
                assert_eq!(err.aggregate_id, "agg-2");
                assert_eq!(err.expected_version, 1);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        let events = repo.get_by_aggregate_id("agg-2").await.expect("read");
        assert_eq!(events.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_allow_the_same_version_on_different_aggregates() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-3"), Some(1), "k-1", json!({})))
            .await
            .expect("agg-3 append");
        repo.append(event(Some("agg-4"), Some(1), "k-2", json!({})))
            .await
            .expect("agg-4 append");
        assert_eq!(repo.get_all().await.expect("read").len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_never_conflict_for_events_without_an_aggregate() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(None, Some(1), "k-1", json!({})))
            .await
            .expect("first system event");
        repo.append(event(None, Some(1), "k-2", json!({})))
            .await
            .expect("second system event, same version");
        assert_eq!(repo.get_all().await.expect("read").len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_skip_a_duplicate_idempotency_key_without_error() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-5"), Some(1), "K", json!({ "n": 1 })))
            .await
            .expect("first append");
        repo.append(event(Some("agg-5"), Some(2), "K", json!({ "n": 2 })))
            .await
            .expect("duplicate key must be a no-op, not an error");
        let events = repo.get_all().await.expect("read");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, json!({ "n": 1 }));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_prefer_the_idempotency_skip_over_a_version_conflict() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-6"), Some(1), "K", json!({})))
            .await
            .expect("first append");
        // Same key and same colliding version: the dedup must win.
        repo.append(event(Some("agg-6"), Some(1), "K", json!({})))
            .await
            .expect("duplicate key with colliding version must not conflict");
        assert_eq!(repo.get_all().await.expect("read").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_the_full_log_in_append_order() {
        let repo = InMemoryEventRepository::new();
        repo.append(event(Some("agg-7"), Some(2), "k-1", json!({})))
            .await
            .expect("append");
        repo.append(event(Some("agg-8"), Some(1), "k-2", json!({})))
            .await
            .expect("append");
        let all = repo.get_all().await.expect("read");
        assert_eq!(all[0].aggregate_id.as_deref(), Some("agg-7"));
        assert_eq!(all[1].aggregate_id.as_deref(), Some("agg-8"));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_every_operation_when_offline() {
        let mut repo = InMemoryEventRepository::new();
        repo.toggle_offline();
        let append = repo.append(event(Some("agg-9"), Some(1), "k", json!({}))).await;
        assert!(matches!(append, Err(EventStoreError::Backend(_))));
        let read = repo.get_by_aggregate_id("agg-9").await;
        assert!(matches!(read, Err(EventStoreError::Backend(_))));
        let all = repo.get_all().await;
        assert!(matches!(all, Err(EventStoreError::Backend(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_an_empty_stream_for_an_unknown_aggregate() {
        let repo = InMemoryEventRepository::new();
        let events = repo.get_by_aggregate_id("missing").await.expect("read");
        assert!(events.is_empty());
    }
}
