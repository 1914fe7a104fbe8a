//! Staff session data models.

use crate::{
    audit::AuditEventType,
    auth::{OwnerId, StaffId},
    shift::{Shift, ShiftId},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff session ID type
pub type StaffSessionId = Uuid;

/// A staff member's login instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffSession {
    pub id: StaffSessionId,
    pub staff_id: StaffId,
    pub owner_id: OwnerId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Shift that was active when the session was admitted
    pub shift_id: Option<ShiftId>,
    pub signed_in_at: DateTime<Utc>,
    pub signed_out_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub termination_reason: Option<TerminationReason>,
}

impl StaffSession {
    /// Active and unexpired. Shift liveness is checked separately.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Seconds signed in, clipped to zero under clock skew
    pub fn duration_secs(&self, now: DateTime<Utc>) -> i64 {
        let end = self.signed_out_at.unwrap_or(now);
        (end - self.signed_in_at).num_seconds().max(0)
    }
}

/// Expiry for a session admitted under `shift` at `now`
///
/// The fixed TTL applies, capped by the shift's auto-end deadline if it has one.
pub fn staff_session_expiry(shift: &Shift, now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let by_ttl = now + ttl;
    match shift.auto_end_time {
        Some(deadline) if deadline < by_ttl => deadline,
        _ => by_ttl,
    }
}

/// Why a staff session stopped being active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    SelfSignout,
    OwnerSignout,
    OwnerBulkSignout,
    OwnerSignoutAll,
    ShiftEnded,
    SwitchToAdmin,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::SelfSignout => "self_signout",
            TerminationReason::OwnerSignout => "owner_signout",
            TerminationReason::OwnerBulkSignout => "owner_bulk_signout",
            TerminationReason::OwnerSignoutAll => "owner_signout_all",
            TerminationReason::ShiftEnded => "shift_ended",
            TerminationReason::SwitchToAdmin => "switch_to_admin",
        }
    }

    /// Audit event written when a session ends for this reason
    pub fn audit_event(&self) -> AuditEventType {
        match self {
            TerminationReason::SelfSignout => AuditEventType::StaffSignout,
            TerminationReason::OwnerSignout => AuditEventType::StaffSignoutByOwner,
            TerminationReason::OwnerBulkSignout => AuditEventType::StaffBulkSignoutByOwner,
            TerminationReason::OwnerSignoutAll => AuditEventType::StaffSignoutAllByOwner,
            TerminationReason::ShiftEnded => AuditEventType::StaffSignoutShiftEnded,
            TerminationReason::SwitchToAdmin => AuditEventType::StaffSignoutSwitchToAdmin,
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TerminationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self_signout" => Ok(TerminationReason::SelfSignout),
            "owner_signout" => Ok(TerminationReason::OwnerSignout),
            "owner_bulk_signout" => Ok(TerminationReason::OwnerBulkSignout),
            "owner_signout_all" => Ok(TerminationReason::OwnerSignoutAll),
            "shift_ended" => Ok(TerminationReason::ShiftEnded),
            "switch_to_admin" => Ok(TerminationReason::SwitchToAdmin),
            other => Err(format!("unknown termination reason: {other}")),
        }
    }
}

/// Staff PIN login request
#[derive(Debug, Clone, Deserialize)]
pub struct StaffLoginRequest {
    pub owner_id: OwnerId,
    pub staff_id: StaffId,
    pub pin: String,
}

/// Staff session row awaiting admission
#[derive(Debug, Clone)]
pub struct NewStaffSession {
    pub staff_id: StaffId,
    pub owner_id: OwnerId,
    pub token_hash: String,
    pub signed_in_at: DateTime<Utc>,
    pub ttl: Duration,
}

/// Outcome of the atomic admission step
#[derive(Debug, Clone)]
pub enum Admission {
    Admitted(StaffSession),
    NoActiveShift,
    CapacityExceeded { max: u32 },
}

/// Result of a successful staff login
#[derive(Debug, Clone)]
pub struct IssuedStaffSession {
    pub session: StaffSession,
    /// Plaintext token, returned exactly once
    pub token: String,
}

/// Sessions an owner-initiated sign-out applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSelector {
    One(StaffSessionId),
    Many(Vec<StaffSessionId>),
    AllForOwner,
}

/// Who ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The staff member signed themselves out
    Staff(StaffId),
    /// The owner signed the session out remotely
    Owner(OwnerId),
}

/// A session that was active and has just been ended
#[derive(Debug, Clone, Serialize)]
pub struct TerminatedSession {
    pub session: StaffSession,
    pub duration_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(auto_end_time: Option<DateTime<Utc>>) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Evening".to_string(),
            started_at: Utc::now(),
            ended_at: None,
            max_staff_sessions: 5,
            auto_end_time,
            is_active: true,
            started_by: "owner@example.com".to_string(),
            ended_by: None,
        }
    }

    #[test]
    fn test_expiry_capped_by_auto_end() {
        let now = Utc::now();
        let deadline = now + Duration::hours(2);

        assert_eq!(
            staff_session_expiry(&shift(Some(deadline)), now, Duration::hours(12)),
            deadline
        );
        assert_eq!(
            staff_session_expiry(&shift(None), now, Duration::hours(12)),
            now + Duration::hours(12)
        );
        assert_eq!(
            staff_session_expiry(&shift(Some(now + Duration::days(2))), now, Duration::hours(12)),
            now + Duration::hours(12)
        );
    }

    #[test]
    fn test_duration_clipped_to_zero() {
        let now = Utc::now();
        let session = StaffSession {
            id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            token_hash: String::new(),
            shift_id: None,
            signed_in_at: now + Duration::seconds(30),
            signed_out_at: None,
            expires_at: now + Duration::hours(1),
            is_active: true,
            termination_reason: None,
        };

        assert_eq!(session.duration_secs(now), 0);
        assert_eq!(session.duration_secs(now + Duration::seconds(90)), 60);
    }
}
