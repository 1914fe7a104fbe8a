//! HTTP boundary for `shift_gate`: owner, admin and staff login surfaces,
//! the mode-exclusivity gate as middleware, and cookie transport.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
