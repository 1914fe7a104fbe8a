//! Best-effort audit recorder.

use super::models::{AuditEvent, NewAuditEvent};
use crate::{auth::OwnerId, clock::SharedClock, db::AuditRepository, errors::AccessResult};
use std::sync::Arc;

/// Appends audit events without ever failing the operation they describe
///
/// Audit writes are not transactional with the state change they record. A
/// write that fails is logged locally and dropped.
#[derive(Clone)]
pub struct AuditRecorder {
    repo: Arc<dyn AuditRepository>,
    clock: SharedClock,
}

impl AuditRecorder {
    pub fn new(repo: Arc<dyn AuditRepository>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    /// Record an event
    pub async fn record(&self, event: NewAuditEvent) {
        let owner_id = event.owner_id;
        let event_type = event.event_type;

        if let Err(e) = self.repo.append_event(event, self.clock.now()).await {
            log::warn!("Dropped audit event {event_type} for owner {owner_id}: {e}");
        }
    }

    /// Most recent events for an owner, newest first
    pub async fn recent(&self, owner_id: OwnerId, limit: i64) -> AccessResult<Vec<AuditEvent>> {
        self.repo.list_events(owner_id, limit).await
    }
}
