//! Repository trait definitions for testability and dependency injection.
//!
//! Managers depend on these traits only. [`PgStore`](super::PgStore) backs
//! production, [`MemoryStore`](super::MemoryStore) backs tests and demos.
//!
//! Two operations must be serialized per owner and are therefore single trait
//! methods rather than read-then-write sequences:
//! [`StaffSessionRepository::admit_staff_session`] and
//! [`ShiftRepository::end_shifts`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::activity::{ActivityRecord, ActivityUpdate};
use crate::admin::{AdminSession, AdminSessionId, NewAdminSession};
use crate::audit::{AuditEvent, AuditEventType, NewAuditEvent};
use crate::auth::{OwnerId, OwnerIdentity, StaffId, StaffIdentity};
use crate::errors::AccessResult;
use crate::shift::{EndedShift, NewShift, Shift, ShiftId, ShiftTarget};
use crate::staff::{
    Admission, NewStaffSession, SessionSelector, StaffSession, StaffSessionId, TerminationReason,
};

/// Read-only access to owner and staff records
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Find owner by login email
    async fn find_owner_by_email(&self, email: &str) -> AccessResult<Option<OwnerIdentity>>;

    /// Find owner by ID
    async fn find_owner(&self, owner_id: OwnerId) -> AccessResult<Option<OwnerIdentity>>;

    /// Find a staff member belonging to an owner
    async fn find_staff(
        &self,
        owner_id: OwnerId,
        staff_id: StaffId,
    ) -> AccessResult<Option<StaffIdentity>>;
}

/// Admin elevation persistence
#[async_trait]
pub trait AdminSessionRepository: Send + Sync {
    /// Insert a session, deactivating any active session for the same
    /// (owner, purpose). Returns the new session and how many were superseded.
    ///
    /// # Errors
    ///
    /// * `AccessError::DuplicateToken` - Token digest already stored
    async fn create_admin_session(
        &self,
        session: NewAdminSession,
    ) -> AccessResult<(AdminSession, u64)>;

    /// Find session by token digest
    async fn find_admin_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<AdminSession>>;

    /// Mark a session inactive. Returns `false` if it already was.
    async fn end_admin_session(
        &self,
        session_id: AdminSessionId,
        now: DateTime<Utc>,
    ) -> AccessResult<bool>;

    /// Active, unexpired sessions of an owner
    async fn list_active_admin_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<AdminSession>>;
}

/// Shift persistence
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// Insert a shift
    ///
    /// # Errors
    ///
    /// * `AccessError::ShiftAlreadyActive` - Owner already has an active shift
    async fn create_shift(&self, shift: NewShift) -> AccessResult<Shift>;

    /// The owner's active shift, if any (expired or not)
    async fn find_active_shift(&self, owner_id: OwnerId) -> AccessResult<Option<Shift>>;

    /// Find shift by ID
    async fn find_shift(&self, shift_id: ShiftId) -> AccessResult<Option<Shift>>;

    /// Active, unexpired staff sessions admitted under a shift
    async fn count_live_sessions(&self, shift_id: ShiftId, now: DateTime<Utc>)
    -> AccessResult<u32>;

    /// Atomically end the targeted active shifts of an owner and deactivate
    /// every staff session tied to them. Already-ended shifts are skipped.
    ///
    /// # Errors
    ///
    /// * `AccessError::NotFound` - `ShiftTarget::One` names no shift of this owner
    async fn end_shifts(
        &self,
        owner_id: OwnerId,
        target: ShiftTarget,
        ended_by: &str,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<EndedShift>>;
}

/// Staff session persistence
#[async_trait]
pub trait StaffSessionRepository: Send + Sync {
    /// Atomically check the owner's active shift and its live-session count,
    /// and insert the session if there is room.
    ///
    /// # Errors
    ///
    /// * `AccessError::DuplicateToken` - Token digest already stored
    async fn admit_staff_session(&self, session: NewStaffSession) -> AccessResult<Admission>;

    /// Find session by token digest
    async fn find_staff_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<StaffSession>>;

    /// Find session by ID
    async fn find_staff_session(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<StaffSession>>;

    /// Deactivate the selected active sessions of an owner and return the
    /// ones that transitioned. Sessions already inactive are left untouched.
    async fn end_staff_sessions(
        &self,
        owner_id: OwnerId,
        selector: &SessionSelector,
        reason: TerminationReason,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>>;

    /// Active, unexpired sessions of an owner
    async fn list_live_staff_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>>;
}

/// Audit event persistence
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append an event
    async fn append_event(
        &self,
        event: NewAuditEvent,
        now: DateTime<Utc>,
    ) -> AccessResult<AuditEvent>;

    /// Count events of the given types for an (owner, actor) since an instant
    async fn count_events_since(
        &self,
        owner_id: OwnerId,
        actor: &str,
        event_types: &[AuditEventType],
        since: DateTime<Utc>,
    ) -> AccessResult<u64>;

    /// Most recent events of an owner, newest first
    async fn list_events(&self, owner_id: OwnerId, limit: i64) -> AccessResult<Vec<AuditEvent>>;
}

/// Activity telemetry persistence
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Atomically fold an update into a session's record, creating it if absent
    async fn apply_activity(
        &self,
        session: &StaffSession,
        update: &ActivityUpdate,
        now: DateTime<Utc>,
    ) -> AccessResult<ActivityRecord>;

    /// Load a session's record
    async fn find_activity(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<ActivityRecord>>;
}

/// Every repository behind one handle
pub trait Store:
    IdentityRepository
    + AdminSessionRepository
    + ShiftRepository
    + StaffSessionRepository
    + AuditRepository
    + ActivityRepository
{
}

impl<T> Store for T where
    T: IdentityRepository
        + AdminSessionRepository
        + ShiftRepository
        + StaffSessionRepository
        + AuditRepository
        + ActivityRepository
{
}
