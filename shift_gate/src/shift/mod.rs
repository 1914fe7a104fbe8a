//! Work shifts: the owner-controlled window that gates staff logins.
//!
//! At most one shift is active per owner. Ending a shift, manually or through
//! the lazy auto-end sweep, deactivates every staff session admitted under it
//! in the same atomic step.

pub mod manager;
pub mod models;

pub use manager::{AUTO_END_ACTOR, ShiftManager, auto_end_deadline, is_expired};
pub use models::{
    EndedShift, NewShift, Shift, ShiftEndReason, ShiftId, ShiftStatus, ShiftTarget,
    StartShiftRequest,
};
