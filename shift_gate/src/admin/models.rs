//! Admin elevation data models.

use crate::auth::{OwnerId, OwnerIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin session ID type
pub type AdminSessionId = Uuid;

/// Elevated, time-boxed grant for one sensitive operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: AdminSessionId,
    pub owner_id: OwnerId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Sensitive operation this elevation authorizes
    pub required_for: String,
    /// Email of the identity that passed verification
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub ended_at: Option<DateTime<Utc>>,
}

impl AdminSession {
    /// Valid iff active and strictly before expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

/// Two-factor elevation request
#[derive(Debug, Clone, Deserialize)]
pub struct ElevationRequest {
    pub email: String,
    pub password: String,
    pub admin_pin: String,
    pub required_for: String,
}

/// Admin session row awaiting insertion
#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub owner_id: OwnerId,
    pub token_hash: String,
    pub required_for: String,
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful elevation
#[derive(Debug, Clone)]
pub struct IssuedAdminSession {
    pub session: AdminSession,
    /// Plaintext token, returned exactly once
    pub token: String,
    pub owner: OwnerIdentity,
    /// Earlier sessions for the same purpose that this one replaced
    pub superseded: u64,
}
