// EventStore façade: the entry point domain code emits events through.
//
// Responsibilities
// - Validate the draft and stamp the storage-generated fields.
// - Delegate the atomic conflict/duplicate check to the repository port.
// - Propagate ConcurrencyError unchanged; it is the one error callers catch.

use crate::core::event::{EventDraft, EventMetadata, StoredEvent};
use crate::core::ports::{EventRepository, EventStoreError};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct EventStore<R>
where
    R: EventRepository + 'static,
{
    /// Identifies the emitting subsystem on every event (audit trails).
    source: String,
    repository: Arc<R>,
}

impl<R> EventStore<R>
where
    R: EventRepository + 'static,
{
    pub fn new(source: impl Into<String>, repository: Arc<R>) -> Self {
        Self {
            source: source.into(),
            repository,
        }
    }

    /// Stamp the draft and append it.
    ///
    /// Returns the stamped event. When the draft carries an idempotency key
    /// that was already used, the repository skips the write and this still
    /// returns Ok: the returned event is the locally stamped one, not the
    /// record stored by the earlier call. Callers that need the canonical
    /// record after a retry re-read the stream.
    pub async fn emit(&self, draft: EventDraft) -> Result<StoredEvent, EventStoreError> {
        if draft.aggregate_id.is_some() != draft.version.is_some() {
            return Err(EventStoreError::InvalidDraft(
                "aggregate_id and version must be supplied together".into(),
            ));
        }

        let event = StoredEvent {
            id: Uuid::now_v7(),
            event_type: draft.event_type,
            aggregate_id: draft.aggregate_id,
            aggregate_type: draft.aggregate_type,
            version: draft.version,
            payload: draft.payload,
            metadata: EventMetadata {
                correlation_id: draft.correlation_id,
                causation_id: draft.causation_id,
                idempotency_key: draft
                    .idempotency_key
                    .unwrap_or_else(|| Uuid::now_v7().to_string()),
                timestamp: Utc::now().timestamp_millis(),
                source: self.source.clone(),
            },
        };

        self.repository.append(event.clone()).await?;
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            source = %self.source,
            "event emitted"
        );
        Ok(event)
    }

    /// One aggregate's events, ascending by version.
    pub async fn get_by_aggregate_id(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.repository.get_by_aggregate_id(aggregate_id).await
    }
}
