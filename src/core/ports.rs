// Ports define what the store core needs from the outside world, without implementing it.
//
// Purpose
// - Describe the storage contract every backend (in-memory, relational) must satisfy.
//
// Responsibilities
// - Keep the core independent of any database by coding against traits.
//
// Boundaries
// - No concrete storage here. Adapters implement these traits in the adapters layer.
//
// Testing guidance
// - Provide in memory implementations for tests and local development.

use crate::core::event::StoredEvent;
use async_trait::async_trait;
use thiserror::Error;

/// Optimistic-lock conflict: another writer already committed an event for
/// this `(aggregate_id, version)` pair. Expected and retryable; the caller
/// reloads the aggregate, recomputes its version and resubmits.
///
/// External tooling pattern-matches on the message; it always contains the
/// substring "version conflict" and the aggregate id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("version conflict: aggregate {aggregate_id} already has an event at version {expected_version}")]
pub struct ConcurrencyError {
    /// The aggregate in conflict.
    pub aggregate_id: String,
    /// The version the caller attempted to use.
    pub expected_version: i64,
}

impl ConcurrencyError {
    pub const CODE: &'static str = "CONCURRENCY_ERROR";

    /// Stable machine-readable code for log scrapers and API mappers.
    pub fn code(&self) -> &'static str {
        Self::CODE
    }
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error(transparent)]
    Conflict(#[from] ConcurrencyError),

    /// Malformed draft; fatal to the call, not retryable without fixing the caller.
    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    /// Opaque infrastructure failure (connectivity, serialization).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage contract for the append-only event log.
///
/// `append` must evaluate the idempotency check, then the conflict check,
/// then persist, as one atomic step: a duplicate idempotency key is a silent
/// no-op and must never surface a concurrency error, even when the version
/// also collides.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn append(&self, event: StoredEvent) -> Result<(), EventStoreError>;

    /// Events for one aggregate, ascending by version. Empty if none.
    async fn get_by_aggregate_id(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// The whole log in append order. Diagnostics and tests, not hot paths.
    async fn get_all(&self) -> Result<Vec<StoredEvent>, EventStoreError>;
}

#[cfg(test)]
mod concurrency_error_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn it_should_expose_a_stable_code() {
        let err = ConcurrencyError {
            aggregate_id: "patient-0001".to_string(),
            expected_version: 3,
        };
        assert_eq!(err.code(), "CONCURRENCY_ERROR");
        assert_eq!(ConcurrencyError::CODE, "CONCURRENCY_ERROR");
    }

    #[rstest]
    fn it_should_mention_version_conflict_and_the_aggregate_in_the_message() {
        let err = ConcurrencyError {
            aggregate_id: "patient-0001".to_string(),
            expected_version: 3,
        };
        let message = err.to_string();
        assert!(message.contains("version conflict"), "got: {message}");
        assert!(message.contains("patient-0001"), "got: {message}");
        assert!(message.contains('3'), "got: {message}");
    }

    #[rstest]
    fn it_should_wrap_into_the_store_error_transparently() {
        let err = ConcurrencyError {
            aggregate_id: "patient-0001".to_string(),
            expected_version: 3,
        };
        let wrapped: EventStoreError = err.clone().into();
        assert_eq!(wrapped.to_string(), err.to_string());
        assert!(matches!(wrapped, EventStoreError::Conflict(inner) if inner == err));
    }
}
