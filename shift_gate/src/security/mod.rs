//! Security policies layered on top of credential verification.
//!
//! ## Login lockout
//!
//! [`LoginThrottle`] counts `*_failed` audit events per (owner, actor) inside a
//! sliding window. At or above the threshold, owner login, admin elevation
//! and staff PIN login fail fast with `RateLimited` before any secret is
//! hashed. Defaults: 5 failures per 15 minutes.

pub mod lockout;

pub use lockout::{LockoutStatus, LoginThrottle};
