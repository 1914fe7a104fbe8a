//! Shift lifecycle: start, status, end with cascade, lazy auto-end.

use super::models::{
    EndedShift, NewShift, Shift, ShiftEndReason, ShiftStatus, ShiftTarget, StartShiftRequest,
};
use crate::{
    audit::{AuditEventType, AuditRecorder, NewAuditEvent},
    auth::{ClientInfo, OwnerId},
    clock::SharedClock,
    config::AccessPolicy,
    db::ShiftRepository,
    errors::{AccessError, AccessResult},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;

/// `ended_by` recorded on shifts closed by the lazy sweep
pub const AUTO_END_ACTOR: &str = "system:auto_end";

/// Whether an active shift has passed its auto-end deadline
///
/// Shifts without a deadline never expire on their own.
pub fn is_expired(shift: &Shift, now: DateTime<Utc>) -> bool {
    shift.is_active && shift.auto_end_time.is_some_and(|deadline| now >= deadline)
}

/// Deadline `hours` after `now`, or `None` past the representable range
pub fn auto_end_deadline(now: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    Duration::try_hours(i64::from(hours)).and_then(|delta| now.checked_add_signed(delta))
}

/// Shift manager
///
/// There is no background timer. Every read or write first runs
/// [`ShiftManager::sweep`], which ends an expired shift through the same
/// cascade a manual end uses.
#[derive(Clone)]
pub struct ShiftManager {
    shifts: Arc<dyn ShiftRepository>,
    audit: AuditRecorder,
    clock: SharedClock,
    policy: AccessPolicy,
}

impl ShiftManager {
    pub fn new(
        shifts: Arc<dyn ShiftRepository>,
        audit: AuditRecorder,
        clock: SharedClock,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            shifts,
            audit,
            clock,
            policy,
        }
    }

    /// Open a shift for an owner
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Owner opening the shift
    /// * `started_by` - Identity label recorded on the shift (owner email)
    /// * `request` - Name, capacity and optional auto-end window
    /// * `client` - Request metadata for the audit trail
    ///
    /// # Errors
    ///
    /// * `AccessError::InvalidInput` - Blank name, zero capacity or zero auto-end hours
    /// * `AccessError::ShiftAlreadyActive` - Owner already has an open shift
    pub async fn start(
        &self,
        owner_id: OwnerId,
        started_by: &str,
        request: StartShiftRequest,
        client: &ClientInfo,
    ) -> AccessResult<Shift> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AccessError::InvalidInput(
                "shift name must not be empty".to_string(),
            ));
        }

        let max_staff_sessions = request
            .max_staff_sessions
            .unwrap_or(self.policy.default_max_staff_sessions);
        if max_staff_sessions < 1 {
            return Err(AccessError::InvalidInput(
                "max staff sessions must be at least 1".to_string(),
            ));
        }
        if request.auto_end_hours == Some(0) {
            return Err(AccessError::InvalidInput(
                "auto end hours must be positive".to_string(),
            ));
        }

        // An expired shift must not block the new one
        self.sweep(owner_id).await?;

        let now = self.clock.now();
        let auto_end_time = match request.auto_end_hours {
            Some(hours) => Some(auto_end_deadline(now, hours).ok_or_else(|| {
                AccessError::InvalidInput("auto end hours out of range".to_string())
            })?),
            None => None,
        };
        let shift = self
            .shifts
            .create_shift(NewShift {
                owner_id,
                name: name.to_string(),
                started_at: now,
                max_staff_sessions,
                auto_end_time,
                started_by: started_by.to_string(),
            })
            .await?;

        log::info!(
            "Shift {} '{}' started for owner {owner_id} (capacity {max_staff_sessions})",
            shift.id,
            shift.name
        );

        self.audit
            .record(
                NewAuditEvent::new(owner_id, AuditEventType::ShiftStarted)
                    .by_owner(owner_id)
                    .client(client)
                    .detail(json!({
                        "shift_id": shift.id,
                        "shift_name": shift.name,
                        "max_staff_sessions": shift.max_staff_sessions,
                        "auto_end_time": shift.auto_end_time,
                    })),
            )
            .await;

        Ok(shift)
    }

    /// Current shift snapshot for an owner
    pub async fn status(&self, owner_id: OwnerId) -> AccessResult<ShiftStatus> {
        let Some(shift) = self.active_shift(owner_id).await? else {
            return Ok(ShiftStatus::inactive());
        };

        let active_staff_count = self
            .shifts
            .count_live_sessions(shift.id, self.clock.now())
            .await?;

        Ok(ShiftStatus {
            is_active: true,
            max_staff_allowed: shift.max_staff_sessions,
            active_staff_count,
            shift: Some(shift),
        })
    }

    /// The owner's open shift after sweeping an expired one
    pub async fn active_shift(&self, owner_id: OwnerId) -> AccessResult<Option<Shift>> {
        self.sweep(owner_id).await?;
        self.shifts.find_active_shift(owner_id).await
    }

    /// Find a shift by ID, sweeping its owner first
    pub async fn find(&self, shift_id: super::ShiftId) -> AccessResult<Option<Shift>> {
        let Some(shift) = self.shifts.find_shift(shift_id).await? else {
            return Ok(None);
        };
        if is_expired(&shift, self.clock.now()) {
            self.sweep(shift.owner_id).await?;
            return self.shifts.find_shift(shift_id).await;
        }
        Ok(Some(shift))
    }

    /// End one shift or every active shift of an owner
    ///
    /// Ending a shift that already ended is a no-op and returns an empty list.
    ///
    /// # Errors
    ///
    /// * `AccessError::NotFound` - `ShiftTarget::One` names no shift of this owner
    pub async fn end(
        &self,
        owner_id: OwnerId,
        target: ShiftTarget,
        ended_by: &str,
        client: &ClientInfo,
    ) -> AccessResult<Vec<EndedShift>> {
        self.sweep(owner_id).await?;

        let ended = self
            .shifts
            .end_shifts(owner_id, target, ended_by, self.clock.now())
            .await?;

        self.record_ended(&ended, ShiftEndReason::Manual, Some(client))
            .await;
        Ok(ended)
    }

    /// End the owner's shift if its auto-end deadline has passed
    ///
    /// Concurrent sweeps are safe: only the one that actually transitions the
    /// shift gets a non-empty result and writes audit events.
    pub async fn sweep(&self, owner_id: OwnerId) -> AccessResult<Option<EndedShift>> {
        let now = self.clock.now();
        let Some(shift) = self.shifts.find_active_shift(owner_id).await? else {
            return Ok(None);
        };
        if !is_expired(&shift, now) {
            return Ok(None);
        }

        let mut ended = self
            .shifts
            .end_shifts(owner_id, ShiftTarget::One(shift.id), AUTO_END_ACTOR, now)
            .await?;

        self.record_ended(&ended, ShiftEndReason::AutoEnded, None)
            .await;

        if let Some(ended) = ended.first() {
            log::info!(
                "Shift {} auto-ended for owner {owner_id}, {} staff session(s) closed",
                ended.shift.id,
                ended.terminated.len()
            );
        }
        Ok(ended.pop())
    }

    async fn record_ended(
        &self,
        ended: &[EndedShift],
        reason: ShiftEndReason,
        client: Option<&ClientInfo>,
    ) {
        let now = self.clock.now();
        let client = client.cloned().unwrap_or_default();

        for EndedShift { shift, terminated } in ended {
            let event_type = match reason {
                ShiftEndReason::Manual => AuditEventType::ShiftEnded,
                ShiftEndReason::AutoEnded => AuditEventType::ShiftAutoEnded,
            };
            let mut event = NewAuditEvent::new(shift.owner_id, event_type)
                .client(&client)
                .detail(json!({
                    "shift_id": shift.id,
                    "shift_name": shift.name,
                    "ended_by": shift.ended_by,
                    "sessions_terminated": terminated.len(),
                }));
            if reason == ShiftEndReason::Manual {
                event = event.by_owner(shift.owner_id);
            }
            self.audit.record(event).await;

            for session in terminated {
                let reason = session
                    .termination_reason
                    .unwrap_or(crate::staff::TerminationReason::ShiftEnded);
                self.audit
                    .record(
                        NewAuditEvent::new(session.owner_id, reason.audit_event())
                            .by_staff(session.staff_id)
                            .client(&client)
                            .detail(json!({
                                "session_id": session.id,
                                "shift_id": shift.id,
                                "termination_reason": reason,
                                "duration_secs": session.duration_secs(now),
                            })),
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn shift(auto_end_time: Option<DateTime<Utc>>, is_active: bool) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Morning".to_string(),
            started_at: Utc::now(),
            ended_at: None,
            max_staff_sessions: 3,
            auto_end_time,
            is_active,
            started_by: "owner@example.com".to_string(),
            ended_by: None,
        }
    }

    #[test]
    fn test_auto_end_deadline() {
        let now = Utc::now();
        assert_eq!(auto_end_deadline(now, 8), Some(now + Duration::hours(8)));
        assert_eq!(auto_end_deadline(now, u32::MAX), None);
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();

        assert!(!is_expired(&shift(None, true), now));
        assert!(!is_expired(&shift(Some(now + Duration::seconds(1)), true), now));
        assert!(is_expired(&shift(Some(now), true), now));
        assert!(is_expired(&shift(Some(now - Duration::hours(1)), true), now));
        // Ended shifts are not "expired", they are already closed
        assert!(!is_expired(&shift(Some(now - Duration::hours(1)), false), now));
    }
}
