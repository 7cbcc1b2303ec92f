use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use clinic_event_store::adapters::in_memory::in_memory_event_repository::InMemoryEventRepository;
use clinic_event_store::application::event_store::EventStore;
use clinic_event_store::core::event::EventDraft;
use clinic_event_store::core::ports::{EventRepository, EventStoreError};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // In-memory deps for now
    let repository = Arc::new(InMemoryEventRepository::new());
    let scheduling = EventStore::new("scheduling", repository.clone());
    let consent = EventStore::new("gdpr_consent", repository.clone());

    let registered = scheduling
        .emit(EventDraft {
            event_type: "PatientRegistered".to_string(),
            correlation_id: "req-0001".to_string(),
            causation_id: None,
            aggregate_id: Some("patient-0001".to_string()),
            aggregate_type: Some("Patient".to_string()),
            version: Some(1),
            payload: json!({ "name": "A. Muster" }),
            idempotency_key: None,
        })
        .await?;

    consent
        .emit(EventDraft {
            event_type: "ConsentGranted".to_string(),
            correlation_id: "req-0002".to_string(),
            causation_id: Some(registered.id.to_string()),
            aggregate_id: Some("patient-0001".to_string()),
            aggregate_type: Some("Patient".to_string()),
            version: Some(2),
            payload: json!({ "scope": "treatment" }),
            idempotency_key: Some("consent-cmd-0002".to_string()),
        })
        .await?;

    // A stale writer racing on version 2 loses with a typed conflict.
    let stale = scheduling
        .emit(EventDraft {
            event_type: "AppointmentScheduled".to_string(),
            correlation_id: "req-0003".to_string(),
            causation_id: None,
            aggregate_id: Some("patient-0001".to_string()),
            aggregate_type: Some("Patient".to_string()),
            version: Some(2),
            payload: json!({ "slot": "2026-03-01T09:00" }),
            idempotency_key: None,
        })
        .await;
    match stale {
        Err(EventStoreError::Conflict(err)) => {
            tracing::warn!(code = err.code(), "{err}");
        }
        other => anyhow::bail!("expected a version conflict, got {other:?}"),
    }

    // Retrying the consent command with the same key is a silent no-op.
    consent
        .emit(EventDraft {
            event_type: "ConsentGranted".to_string(),
            correlation_id: "req-0002".to_string(),
            causation_id: Some(registered.id.to_string()),
            aggregate_id: Some("patient-0001".to_string()),
            aggregate_type: Some("Patient".to_string()),
            version: Some(3),
            payload: json!({ "scope": "treatment" }),
            idempotency_key: Some("consent-cmd-0002".to_string()),
        })
        .await?;

    for event in repository.get_by_aggregate_id("patient-0001").await? {
        tracing::info!(
            version = event.version,
            source = %event.metadata.source,
            "{}",
            event.event_type
        );
    }
    Ok(())
}
