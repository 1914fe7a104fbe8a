//! Identity data models.
//!
//! Owners and staff members are never created or deleted by this crate; they
//! are read from the identity store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner ID type. One owner per tenant, so this also identifies the business.
pub type OwnerId = Uuid;

/// Staff member ID type
pub type StaffId = Uuid;

/// Tenant owner account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerIdentity {
    pub id: OwnerId,
    pub email: String,
    pub display_name: String,
    pub business_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub admin_pin_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Staff role within a business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Cashier,
    Server,
    Kitchen,
    Manager,
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Cashier => write!(f, "cashier"),
            StaffRole::Server => write!(f, "server"),
            StaffRole::Kitchen => write!(f, "kitchen"),
            StaffRole::Manager => write!(f, "manager"),
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cashier" => Ok(StaffRole::Cashier),
            "server" => Ok(StaffRole::Server),
            "kitchen" => Ok(StaffRole::Kitchen),
            "manager" => Ok(StaffRole::Manager),
            other => Err(format!("unknown staff role: {other}")),
        }
    }
}

/// Staff member scoped to one owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub id: StaffId,
    pub owner_id: OwnerId,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
}

/// Request metadata recorded alongside audit events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Claims carried by the owner's baseline session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerClaims {
    pub sub: OwnerId,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}
