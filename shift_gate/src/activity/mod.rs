//! Activity telemetry: per-staff-session usage accumulators and a derived
//! productivity score.

pub mod models;
pub mod score;
pub mod telemetry;

pub use models::{
    ActivityRecord, ActivitySummary, ActivityUpdate, ScreenVisit, TaskOutcome,
};
pub use score::productivity_score;
pub use telemetry::ActivityTelemetry;
