//! Shift data models.

use crate::{auth::OwnerId, staff::StaffSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shift ID type
pub type ShiftId = Uuid;

/// Window during which staff logins are permitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub owner_id: OwnerId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub max_staff_sessions: u32,
    pub auto_end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub started_by: String,
    pub ended_by: Option<String>,
}

/// Shift snapshot used for admission decisions and operator views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftStatus {
    pub is_active: bool,
    pub shift: Option<Shift>,
    pub active_staff_count: u32,
    pub max_staff_allowed: u32,
}

impl ShiftStatus {
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            shift: None,
            active_staff_count: 0,
            max_staff_allowed: 0,
        }
    }

    /// Whether one more staff session would fit
    pub fn has_capacity(&self) -> bool {
        self.is_active && self.active_staff_count < self.max_staff_allowed
    }
}

/// Owner request to open a shift
#[derive(Debug, Clone, Deserialize)]
pub struct StartShiftRequest {
    pub name: String,
    pub max_staff_sessions: Option<u32>,
    pub auto_end_hours: Option<u32>,
}

/// Shift row awaiting insertion
#[derive(Debug, Clone)]
pub struct NewShift {
    pub owner_id: OwnerId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub max_staff_sessions: u32,
    pub auto_end_time: Option<DateTime<Utc>>,
    pub started_by: String,
}

/// Which shifts an end request applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftTarget {
    One(ShiftId),
    AllActive,
}

/// Why a shift ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftEndReason {
    Manual,
    AutoEnded,
}

/// A shift that transitioned to ended, with the sessions its cascade closed
#[derive(Debug, Clone)]
pub struct EndedShift {
    pub shift: Shift,
    pub terminated: Vec<StaffSession>,
}
