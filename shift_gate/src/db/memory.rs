//! In-memory repository implementation.
//!
//! All tables sit behind one async mutex, so every trait method is atomic
//! with respect to every other. That gives the same per-owner serialization
//! the PostgreSQL store gets from row locks, just coarser.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::repository::{
    ActivityRepository, AdminSessionRepository, AuditRepository, IdentityRepository,
    ShiftRepository, StaffSessionRepository,
};
use crate::activity::{ActivityRecord, ActivityUpdate};
use crate::admin::{AdminSession, AdminSessionId, NewAdminSession};
use crate::audit::{AuditEvent, AuditEventType, NewAuditEvent};
use crate::auth::{OwnerId, OwnerIdentity, StaffId, StaffIdentity, digests_match};
use crate::errors::{AccessError, AccessResult};
use crate::shift::{EndedShift, NewShift, Shift, ShiftId, ShiftTarget};
use crate::staff::{
    Admission, NewStaffSession, SessionSelector, StaffSession, StaffSessionId, TerminationReason,
    staff_session_expiry,
};

#[derive(Default)]
struct Tables {
    owners: HashMap<OwnerId, OwnerIdentity>,
    staff: HashMap<StaffId, StaffIdentity>,
    admin_sessions: HashMap<AdminSessionId, AdminSession>,
    shifts: HashMap<ShiftId, Shift>,
    staff_sessions: HashMap<StaffSessionId, StaffSession>,
    audit_events: Vec<AuditEvent>,
    activity: HashMap<StaffSessionId, ActivityRecord>,
}

impl Tables {
    fn token_in_use(&self, token_hash: &str) -> bool {
        self.admin_sessions
            .values()
            .any(|s| digests_match(&s.token_hash, token_hash))
            || self
                .staff_sessions
                .values()
                .any(|s| digests_match(&s.token_hash, token_hash))
    }

    fn live_count(&self, shift_id: ShiftId, now: DateTime<Utc>) -> u32 {
        self.staff_sessions
            .values()
            .filter(|s| s.shift_id == Some(shift_id) && s.is_live_at(now))
            .count() as u32
    }

    fn active_shift(&self, owner_id: OwnerId) -> Option<&Shift> {
        self.shifts
            .values()
            .find(|s| s.owner_id == owner_id && s.is_active)
    }
}

/// Repository backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an owner record
    pub async fn insert_owner(&self, owner: OwnerIdentity) {
        self.tables.lock().await.owners.insert(owner.id, owner);
    }

    /// Seed a staff record
    pub async fn insert_staff(&self, staff: StaffIdentity) {
        self.tables.lock().await.staff.insert(staff.id, staff);
    }

    /// Snapshot of every staff session, for assertions
    pub async fn all_staff_sessions(&self) -> Vec<StaffSession> {
        self.tables
            .lock()
            .await
            .staff_sessions
            .values()
            .cloned()
            .collect()
    }

    /// Snapshot of every audit event in insertion order, for assertions
    pub async fn all_audit_events(&self) -> Vec<AuditEvent> {
        self.tables.lock().await.audit_events.clone()
    }

    /// Snapshot of every admin session, for assertions
    pub async fn all_admin_sessions(&self) -> Vec<AdminSession> {
        self.tables
            .lock()
            .await
            .admin_sessions
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl IdentityRepository for MemoryStore {
    async fn find_owner_by_email(&self, email: &str) -> AccessResult<Option<OwnerIdentity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .owners
            .values()
            .find(|o| o.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_owner(&self, owner_id: OwnerId) -> AccessResult<Option<OwnerIdentity>> {
        Ok(self.tables.lock().await.owners.get(&owner_id).cloned())
    }

    async fn find_staff(
        &self,
        owner_id: OwnerId,
        staff_id: StaffId,
    ) -> AccessResult<Option<StaffIdentity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .staff
            .get(&staff_id)
            .filter(|s| s.owner_id == owner_id)
            .cloned())
    }
}

#[async_trait]
impl AdminSessionRepository for MemoryStore {
    async fn create_admin_session(
        &self,
        new: NewAdminSession,
    ) -> AccessResult<(AdminSession, u64)> {
        let mut tables = self.tables.lock().await;
        if tables.token_in_use(&new.token_hash) {
            return Err(AccessError::DuplicateToken);
        }

        let mut superseded = 0;
        for session in tables.admin_sessions.values_mut() {
            if session.owner_id == new.owner_id
                && session.required_for == new.required_for
                && session.is_active
            {
                session.is_active = false;
                session.ended_at = Some(new.created_at);
                superseded += 1;
            }
        }

        let session = AdminSession {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            token_hash: new.token_hash,
            required_for: new.required_for,
            issued_by: new.issued_by,
            created_at: new.created_at,
            expires_at: new.expires_at,
            is_active: true,
            ended_at: None,
        };
        tables.admin_sessions.insert(session.id, session.clone());
        Ok((session, superseded))
    }

    async fn find_admin_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<AdminSession>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .admin_sessions
            .values()
            .find(|s| digests_match(&s.token_hash, token_hash))
            .cloned())
    }

    async fn end_admin_session(
        &self,
        session_id: AdminSessionId,
        now: DateTime<Utc>,
    ) -> AccessResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.admin_sessions.get_mut(&session_id) {
            Some(session) if session.is_active => {
                session.is_active = false;
                session.ended_at = Some(now);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(AccessError::NotFound("admin session")),
        }
    }

    async fn list_active_admin_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<AdminSession>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<AdminSession> = tables
            .admin_sessions
            .values()
            .filter(|s| s.owner_id == owner_id && s.is_valid_at(now))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.created_at));
        Ok(sessions)
    }
}

#[async_trait]
impl ShiftRepository for MemoryStore {
    async fn create_shift(&self, new: NewShift) -> AccessResult<Shift> {
        let mut tables = self.tables.lock().await;
        if tables.active_shift(new.owner_id).is_some() {
            return Err(AccessError::ShiftAlreadyActive);
        }

        let shift = Shift {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name: new.name,
            started_at: new.started_at,
            ended_at: None,
            max_staff_sessions: new.max_staff_sessions,
            auto_end_time: new.auto_end_time,
            is_active: true,
            started_by: new.started_by,
            ended_by: None,
        };
        tables.shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    async fn find_active_shift(&self, owner_id: OwnerId) -> AccessResult<Option<Shift>> {
        Ok(self.tables.lock().await.active_shift(owner_id).cloned())
    }

    async fn find_shift(&self, shift_id: ShiftId) -> AccessResult<Option<Shift>> {
        Ok(self.tables.lock().await.shifts.get(&shift_id).cloned())
    }

    async fn count_live_sessions(
        &self,
        shift_id: ShiftId,
        now: DateTime<Utc>,
    ) -> AccessResult<u32> {
        Ok(self.tables.lock().await.live_count(shift_id, now))
    }

    async fn end_shifts(
        &self,
        owner_id: OwnerId,
        target: ShiftTarget,
        ended_by: &str,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<EndedShift>> {
        let mut tables = self.tables.lock().await;

        let shift_ids: Vec<ShiftId> = match target {
            ShiftTarget::One(shift_id) => match tables.shifts.get(&shift_id) {
                Some(shift) if shift.owner_id == owner_id => {
                    if shift.is_active {
                        vec![shift_id]
                    } else {
                        Vec::new()
                    }
                }
                _ => return Err(AccessError::NotFound("shift")),
            },
            ShiftTarget::AllActive => tables
                .shifts
                .values()
                .filter(|s| s.owner_id == owner_id && s.is_active)
                .map(|s| s.id)
                .collect(),
        };

        let mut ended = Vec::with_capacity(shift_ids.len());
        for shift_id in shift_ids {
            let Some(shift) = tables.shifts.get_mut(&shift_id) else {
                continue;
            };
            shift.is_active = false;
            shift.ended_at = Some(now);
            shift.ended_by = Some(ended_by.to_string());
            let shift = shift.clone();

            let mut terminated = Vec::new();
            for session in tables.staff_sessions.values_mut() {
                if session.shift_id == Some(shift_id) && session.is_active {
                    session.is_active = false;
                    session.signed_out_at = Some(now);
                    session.termination_reason = Some(TerminationReason::ShiftEnded);
                    terminated.push(session.clone());
                }
            }
            ended.push(EndedShift { shift, terminated });
        }

        Ok(ended)
    }
}

#[async_trait]
impl StaffSessionRepository for MemoryStore {
    async fn admit_staff_session(&self, new: NewStaffSession) -> AccessResult<Admission> {
        let mut tables = self.tables.lock().await;
        let now = new.signed_in_at;

        let Some(shift) = tables.active_shift(new.owner_id).cloned() else {
            return Ok(Admission::NoActiveShift);
        };
        if shift.auto_end_time.is_some_and(|deadline| now >= deadline) {
            return Ok(Admission::NoActiveShift);
        }
        if tables.live_count(shift.id, now) >= shift.max_staff_sessions {
            return Ok(Admission::CapacityExceeded {
                max: shift.max_staff_sessions,
            });
        }
        if tables.token_in_use(&new.token_hash) {
            return Err(AccessError::DuplicateToken);
        }

        let session = StaffSession {
            id: Uuid::new_v4(),
            staff_id: new.staff_id,
            owner_id: new.owner_id,
            token_hash: new.token_hash,
            shift_id: Some(shift.id),
            signed_in_at: now,
            signed_out_at: None,
            expires_at: staff_session_expiry(&shift, now, new.ttl),
            is_active: true,
            termination_reason: None,
        };
        tables.staff_sessions.insert(session.id, session.clone());
        Ok(Admission::Admitted(session))
    }

    async fn find_staff_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<StaffSession>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .staff_sessions
            .values()
            .find(|s| digests_match(&s.token_hash, token_hash))
            .cloned())
    }

    async fn find_staff_session(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<StaffSession>> {
        Ok(self.tables.lock().await.staff_sessions.get(&session_id).cloned())
    }

    async fn end_staff_sessions(
        &self,
        owner_id: OwnerId,
        selector: &SessionSelector,
        reason: TerminationReason,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>> {
        let mut tables = self.tables.lock().await;
        let selected = |s: &StaffSession| match selector {
            SessionSelector::One(id) => s.id == *id,
            SessionSelector::Many(ids) => ids.contains(&s.id),
            SessionSelector::AllForOwner => true,
        };

        let mut ended = Vec::new();
        for session in tables.staff_sessions.values_mut() {
            if session.owner_id == owner_id && session.is_active && selected(session) {
                session.is_active = false;
                session.signed_out_at = Some(now);
                session.termination_reason = Some(reason);
                ended.push(session.clone());
            }
        }
        ended.sort_by_key(|s| s.signed_in_at);
        Ok(ended)
    }

    async fn list_live_staff_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<StaffSession> = tables
            .staff_sessions
            .values()
            .filter(|s| s.owner_id == owner_id && s.is_live_at(now))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.signed_in_at);
        Ok(sessions)
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append_event(
        &self,
        event: NewAuditEvent,
        now: DateTime<Utc>,
    ) -> AccessResult<AuditEvent> {
        let event = event.into_event(Uuid::new_v4(), now);
        self.tables.lock().await.audit_events.push(event.clone());
        Ok(event)
    }

    async fn count_events_since(
        &self,
        owner_id: OwnerId,
        actor: &str,
        event_types: &[AuditEventType],
        since: DateTime<Utc>,
    ) -> AccessResult<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .audit_events
            .iter()
            .filter(|e| {
                e.owner_id == owner_id
                    && e.actor == actor
                    && e.created_at >= since
                    && event_types.contains(&e.event_type)
            })
            .count() as u64)
    }

    async fn list_events(&self, owner_id: OwnerId, limit: i64) -> AccessResult<Vec<AuditEvent>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .audit_events
            .iter()
            .rev()
            .filter(|e| e.owner_id == owner_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn apply_activity(
        &self,
        session: &StaffSession,
        update: &ActivityUpdate,
        now: DateTime<Utc>,
    ) -> AccessResult<ActivityRecord> {
        let mut tables = self.tables.lock().await;
        let record = tables.activity.entry(session.id).or_insert_with(|| {
            ActivityRecord::empty(session.id, session.staff_id, session.owner_id, now)
        });
        record.apply(update, now);
        Ok(record.clone())
    }

    async fn find_activity(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<ActivityRecord>> {
        Ok(self.tables.lock().await.activity.get(&session_id).cloned())
    }
}
