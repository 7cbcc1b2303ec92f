// Shared test fixture builder for event drafts.
// Compiled only during tests, exposed through `crate::test_support`.

use crate::core::event::EventDraft;
use serde_json::json;

pub struct EventDraftBuilder {
    inner: EventDraft,
}

impl Default for EventDraftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl EventDraftBuilder {
    /// A draft for an aggregate-scoped fact at version 1.
    pub fn new() -> Self {
        Self {
            inner: EventDraft {
                event_type: "AppointmentScheduled".to_string(),
                correlation_id: "corr-fixed-0001".to_string(),
                causation_id: None,
                aggregate_id: Some("appointment-fixed-0001".to_string()),
                aggregate_type: Some("Appointment".to_string()),
                version: Some(1),
                payload: json!({ "slot": "2026-03-01T09:00" }),
                idempotency_key: None,
            },
        }
    }

    /// A draft for a system-wide fact: no aggregate, no version.
    pub fn system() -> Self {
        Self {
            inner: EventDraft {
                event_type: "NightlyAuditCompleted".to_string(),
                correlation_id: "corr-fixed-0002".to_string(),
                causation_id: None,
                aggregate_id: None,
                aggregate_type: None,
                version: None,
                payload: json!({}),
                idempotency_key: None,
            },
        }
    }

    pub fn event_type(mut self, v: impl Into<String>) -> Self {
        self.inner.event_type = v.into();
        self
    }

    pub fn correlation_id(mut self, v: impl Into<String>) -> Self {
        self.inner.correlation_id = v.into();
        self
    }

    pub fn causation_id(mut self, v: impl Into<String>) -> Self {
        self.inner.causation_id = Some(v.into());
        self
    }

    pub fn aggregate_id(mut self, v: impl Into<String>) -> Self {
        self.inner.aggregate_id = Some(v.into());
        self
    }

    pub fn aggregate_type(mut self, v: impl Into<String>) -> Self {
        self.inner.aggregate_type = Some(v.into());
        self
    }

    pub fn version(mut self, v: i64) -> Self {
        self.inner.version = Some(v);
        self
    }

    pub fn payload(mut self, v: serde_json::Value) -> Self {
        self.inner.payload = v;
        self
    }

    pub fn idempotency_key(mut self, v: impl Into<String>) -> Self {
        self.inner.idempotency_key = Some(v.into());
        self
    }

    pub fn build(self) -> EventDraft {
        self.inner
    }
}
