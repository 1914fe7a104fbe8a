//! Admin elevation: a 15-minute, purpose-tagged grant layered on the owner
//! identity, issued only after both the account password and the admin PIN
//! verify.
//!
//! Per (owner, purpose) a session moves `NONE → ELEVATED → {EXPIRED | ENDED}`.
//! Verification happens inline in
//! [`AdminElevationManager::request_elevation`], so the pending state is never
//! persisted.

pub mod manager;
pub mod models;

pub use manager::AdminElevationManager;
pub use models::{
    AdminSession, AdminSessionId, ElevationRequest, IssuedAdminSession, NewAdminSession,
};
