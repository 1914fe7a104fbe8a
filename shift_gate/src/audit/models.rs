//! Audit event data models.

use crate::auth::{ClientInfo, OwnerId, StaffId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of authentication-relevant transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    OwnerLoginSuccess,
    OwnerLoginFailed,
    AdminLoginSuccess,
    AdminPasswordFailed,
    AdminPinFailed,
    AdminLogout,
    ShiftStarted,
    ShiftEnded,
    ShiftAutoEnded,
    StaffLoginSuccess,
    StaffLoginFailed,
    StaffLoginRejected,
    StaffSignout,
    StaffSignoutByOwner,
    StaffBulkSignoutByOwner,
    StaffSignoutAllByOwner,
    StaffSignoutShiftEnded,
    StaffSignoutSwitchToAdmin,
}

impl AuditEventType {
    pub const ALL: [AuditEventType; 18] = [
        AuditEventType::OwnerLoginSuccess,
        AuditEventType::OwnerLoginFailed,
        AuditEventType::AdminLoginSuccess,
        AuditEventType::AdminPasswordFailed,
        AuditEventType::AdminPinFailed,
        AuditEventType::AdminLogout,
        AuditEventType::ShiftStarted,
        AuditEventType::ShiftEnded,
        AuditEventType::ShiftAutoEnded,
        AuditEventType::StaffLoginSuccess,
        AuditEventType::StaffLoginFailed,
        AuditEventType::StaffLoginRejected,
        AuditEventType::StaffSignout,
        AuditEventType::StaffSignoutByOwner,
        AuditEventType::StaffBulkSignoutByOwner,
        AuditEventType::StaffSignoutAllByOwner,
        AuditEventType::StaffSignoutShiftEnded,
        AuditEventType::StaffSignoutSwitchToAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::OwnerLoginSuccess => "owner_login_success",
            AuditEventType::OwnerLoginFailed => "owner_login_failed",
            AuditEventType::AdminLoginSuccess => "admin_login_success",
            AuditEventType::AdminPasswordFailed => "admin_password_failed",
            AuditEventType::AdminPinFailed => "admin_pin_failed",
            AuditEventType::AdminLogout => "admin_logout",
            AuditEventType::ShiftStarted => "shift_started",
            AuditEventType::ShiftEnded => "shift_ended",
            AuditEventType::ShiftAutoEnded => "shift_auto_ended",
            AuditEventType::StaffLoginSuccess => "staff_login_success",
            AuditEventType::StaffLoginFailed => "staff_login_failed",
            AuditEventType::StaffLoginRejected => "staff_login_rejected",
            AuditEventType::StaffSignout => "staff_signout",
            AuditEventType::StaffSignoutByOwner => "staff_signout_by_owner",
            AuditEventType::StaffBulkSignoutByOwner => "staff_bulk_signout_by_owner",
            AuditEventType::StaffSignoutAllByOwner => "staff_signout_all_by_owner",
            AuditEventType::StaffSignoutShiftEnded => "staff_signout_shift_ended",
            AuditEventType::StaffSignoutSwitchToAdmin => "staff_signout_switch_to_admin",
        }
    }

    /// Failed credential checks, counted by the login throttle
    pub fn is_credential_failure(&self) -> bool {
        Self::CREDENTIAL_FAILURES.contains(self)
    }

    /// Events that count toward login lockout
    pub const CREDENTIAL_FAILURES: [AuditEventType; 4] = [
        AuditEventType::OwnerLoginFailed,
        AuditEventType::AdminPasswordFailed,
        AuditEventType::AdminPinFailed,
        AuditEventType::StaffLoginFailed,
    ];
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditEventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown audit event type: {s}"))
    }
}

/// Immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub owner_id: OwnerId,
    /// Staff id, `"owner"` or `"unknown"`
    pub actor: String,
    pub event_type: AuditEventType,
    pub detail: serde_json::Value,
    pub actor_user_id: Option<OwnerId>,
    pub actor_staff_id: Option<StaffId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit event awaiting persistence
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub owner_id: OwnerId,
    pub event_type: AuditEventType,
    pub detail: serde_json::Value,
    pub actor_user_id: Option<OwnerId>,
    pub actor_staff_id: Option<StaffId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEvent {
    pub fn new(owner_id: OwnerId, event_type: AuditEventType) -> Self {
        Self {
            owner_id,
            event_type,
            detail: serde_json::Value::Object(Default::default()),
            actor_user_id: None,
            actor_staff_id: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }

    /// Attribute the event to the owner account
    pub fn by_owner(mut self, owner_id: OwnerId) -> Self {
        self.actor_user_id = Some(owner_id);
        self
    }

    /// Attribute the event to a staff member
    pub fn by_staff(mut self, staff_id: StaffId) -> Self {
        self.actor_staff_id = Some(staff_id);
        self
    }

    pub fn client(mut self, client: &ClientInfo) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self
    }

    /// Actor label persisted with the event
    pub fn actor(&self) -> String {
        match (self.actor_staff_id, self.actor_user_id) {
            (Some(staff_id), _) => staff_id.to_string(),
            (None, Some(_)) => "owner".to_string(),
            (None, None) => "unknown".to_string(),
        }
    }

    pub fn into_event(self, id: Uuid, created_at: DateTime<Utc>) -> AuditEvent {
        AuditEvent {
            id,
            owner_id: self.owner_id,
            actor: self.actor(),
            event_type: self.event_type,
            detail: self.detail,
            actor_user_id: self.actor_user_id,
            actor_staff_id: self.actor_staff_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at,
        }
    }
}
