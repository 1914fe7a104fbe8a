//! Productivity score derivation.

use super::models::ActivityRecord;

const ACTIVE_WEIGHT: f64 = 0.6;
const TASK_WEIGHT: f64 = 0.4;

/// Score in `[0, 100]`, rounded to two decimals
///
/// Derived from the active/break ratio and, when tasks were recorded, the
/// task success rate. Recomputed from the full record on every call.
pub fn productivity_score(record: &ActivityRecord) -> f64 {
    let total = record.active_minutes + record.break_minutes;
    let active_ratio = if total > 0.0 {
        record.active_minutes / total
    } else {
        0.0
    };

    let raw = if record.task_outcomes.is_empty() {
        active_ratio
    } else {
        let successes = record.task_outcomes.iter().filter(|t| t.success).count() as f64;
        let success_rate = successes / record.task_outcomes.len() as f64;
        ACTIVE_WEIGHT * active_ratio + TASK_WEIGHT * success_rate
    };

    ((raw * 100.0).clamp(0.0, 100.0) * 100.0).round() / 100.0
}
