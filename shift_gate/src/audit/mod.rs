//! Append-only audit trail of every authentication-relevant transition.
//!
//! Each login (successful or not), session termination and shift start/end
//! produces one [`AuditEvent`]. Events are never mutated or deleted.

pub mod models;
pub mod recorder;

pub use models::{AuditEvent, AuditEventType, NewAuditEvent};
pub use recorder::AuditRecorder;
