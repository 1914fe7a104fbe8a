//! Staff session pool: PIN login admission against the open shift's
//! capacity, validation with shift re-check, and self or owner sign-out.

pub mod models;
pub mod pool;

pub use models::{
    Admission, IssuedStaffSession, NewStaffSession, SessionSelector, StaffLoginRequest,
    StaffSession, StaffSessionId, TerminatedSession, TerminationReason, Terminator,
    staff_session_expiry,
};
pub use pool::StaffSessionPool;
