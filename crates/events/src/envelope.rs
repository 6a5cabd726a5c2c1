use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use muhasib_core::OrganizationId;

/// Envelope for an event, containing multi-tenant metadata.
///
/// This is the unit published to reporting consumers.
///
/// Notes:
/// - **Multi-tenancy** is enforced here via `organization_id`.
/// - Ordering metadata lives in the payload where it matters: posted-entry
///   payloads carry the posting sequence assigned by the history store.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    organization_id: OrganizationId,

    /// Stable event name/type identifier (e.g. "ledger.entry.posted").
    event_type: String,

    /// When the event occurred (business time).
    occurred_at: DateTime<Utc>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        organization_id: OrganizationId,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            organization_id,
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
