// Event record types for the append-only store.
//
// Purpose
// - Define the immutable StoredEvent record and the EventDraft callers hand to emit.
//
// Responsibilities
// - Carry identifiers, the opaque payload and the tracing/dedup metadata.
// - Never interpret the payload; that belongs to the emitting domain module.
//
// Versioning and evolution
// - Prefer additive changes. Stored events are historical facts; do not change
//   the meaning of existing fields.
//
// Timestamps
// - All i64 timestamps use the same epoch unit (milliseconds).

use uuid::Uuid;

/// Tracing and deduplication metadata stamped onto every stored event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EventMetadata {
    /// Links the event to the request that caused it.
    pub correlation_id: String,
    /// The id of the event that caused this one, if any.
    pub causation_id: Option<String>,
    /// Dedup token; globally unique across the store.
    pub idempotency_key: String,
    /// When the store accepted the event, epoch milliseconds.
    pub timestamp: i64,
    /// The subsystem that emitted the event (audit trails).
    pub source: String,
}

/// An immutable fact recorded by the store. Never mutated or removed once
/// appended.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct StoredEvent {
    /// Assigned at emit time.
    pub id: Uuid,
    /// Names the fact, for example "CaseScored".
    pub event_type: String,
    /// The entity this event mutates; absent for system-wide events.
    pub aggregate_id: Option<String>,
    /// The aggregate's kind, informational only.
    pub aggregate_type: Option<String>,
    /// Position within the aggregate's event sequence. Required for the
    /// concurrency check to apply; absent for system-wide events.
    pub version: Option<i64>,
    /// Opaque domain data.
    pub payload: serde_json::Value,
    pub metadata: EventMetadata,
}

/// What a caller supplies to `EventStore::emit`: a StoredEvent missing only
/// the storage-generated fields (`id`, `metadata.timestamp`, `metadata.source`
/// and, unless the caller dedupes retries, `idempotency_key`).
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub event_type: String,
    pub correlation_id: String,
    pub causation_id: Option<String>,
    pub aggregate_id: Option<String>,
    pub aggregate_type: Option<String>,
    pub version: Option<i64>,
    pub payload: serde_json::Value,
    /// Supply a stable key to make retries of the same command idempotent;
    /// leave None for a fresh key per emit.
    pub idempotency_key: Option<String>,
}
