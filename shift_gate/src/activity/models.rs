//! Activity telemetry data models.

use crate::{
    auth::{OwnerId, StaffId},
    staff::StaffSessionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time spent on one screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenVisit {
    pub screen_name: String,
    pub duration_minutes: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_name: String,
    pub success: bool,
    pub details: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

/// Per-session usage accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub session_id: StaffSessionId,
    pub staff_id: StaffId,
    pub owner_id: OwnerId,
    pub active_minutes: f64,
    pub break_minutes: f64,
    pub screen_visits: Vec<ScreenVisit>,
    pub task_outcomes: Vec<TaskOutcome>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn empty(
        session_id: StaffSessionId,
        staff_id: StaffId,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            staff_id,
            owner_id,
            active_minutes: 0.0,
            break_minutes: 0.0,
            screen_visits: Vec::new(),
            task_outcomes: Vec::new(),
            updated_at: now,
        }
    }

    /// Fold one update into the accumulator
    pub fn apply(&mut self, update: &ActivityUpdate, now: DateTime<Utc>) {
        match update {
            ActivityUpdate::ScreenAccess {
                screen_name,
                duration_minutes,
            } => self.screen_visits.push(ScreenVisit {
                screen_name: screen_name.clone(),
                duration_minutes: *duration_minutes,
                recorded_at: now,
            }),
            ActivityUpdate::TaskCompletion {
                task_name,
                success,
                details,
            } => self.task_outcomes.push(TaskOutcome {
                task_name: task_name.clone(),
                success: *success,
                details: details.clone(),
                recorded_at: now,
            }),
            ActivityUpdate::ActiveTime { minutes } => self.active_minutes += minutes,
            ActivityUpdate::BreakTime { minutes } => self.break_minutes += minutes,
        }
        self.updated_at = now;
    }
}

/// A discrete telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ActivityUpdate {
    ScreenAccess {
        screen_name: String,
        duration_minutes: f64,
    },
    TaskCompletion {
        task_name: String,
        success: bool,
        #[serde(default)]
        details: Option<serde_json::Value>,
    },
    ActiveTime {
        minutes: f64,
    },
    BreakTime {
        minutes: f64,
    },
}

impl ActivityUpdate {
    /// Reject negative or non-finite minute values and blank names
    pub fn validate(&self) -> Result<(), String> {
        let minutes = match self {
            ActivityUpdate::ScreenAccess {
                screen_name,
                duration_minutes,
            } => {
                if screen_name.trim().is_empty() {
                    return Err("screen_name must not be empty".to_string());
                }
                *duration_minutes
            }
            ActivityUpdate::TaskCompletion { task_name, .. } => {
                if task_name.trim().is_empty() {
                    return Err("task_name must not be empty".to_string());
                }
                return Ok(());
            }
            ActivityUpdate::ActiveTime { minutes } | ActivityUpdate::BreakTime { minutes } => {
                *minutes
            }
        };

        if !minutes.is_finite() || minutes < 0.0 {
            return Err(format!("minutes must be a non-negative number, got {minutes}"));
        }
        Ok(())
    }
}

/// Activity record with its derived score
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    #[serde(flatten)]
    pub record: ActivityRecord,
    pub productivity_score: f64,
}
