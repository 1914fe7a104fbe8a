//! Per-session activity accumulation.

use super::{
    models::{ActivityRecord, ActivitySummary, ActivityUpdate},
    score::productivity_score,
};
use crate::{
    clock::SharedClock,
    db::{ActivityRepository, StaffSessionRepository},
    errors::{AccessError, AccessResult},
    staff::{StaffSession, StaffSessionId},
};
use std::sync::Arc;

/// Activity telemetry
///
/// Records are writable only while their staff session is live. The score is
/// never stored; it is derived from the full record on every read.
#[derive(Clone)]
pub struct ActivityTelemetry {
    sessions: Arc<dyn StaffSessionRepository>,
    activity: Arc<dyn ActivityRepository>,
    clock: SharedClock,
}

impl ActivityTelemetry {
    pub fn new(
        sessions: Arc<dyn StaffSessionRepository>,
        activity: Arc<dyn ActivityRepository>,
        clock: SharedClock,
    ) -> Self {
        Self {
            sessions,
            activity,
            clock,
        }
    }

    /// Fold one update into a live session's record
    ///
    /// # Errors
    ///
    /// * `AccessError::InvalidInput` - Negative minutes or blank names
    /// * `AccessError::NotFound` - Unknown session
    /// * `AccessError::SessionClosed` - Session ended or expired
    pub async fn record(
        &self,
        session_id: StaffSessionId,
        update: ActivityUpdate,
    ) -> AccessResult<ActivityRecord> {
        update.validate().map_err(AccessError::InvalidInput)?;

        let session = self.session(session_id).await?;
        let now = self.clock.now();
        if !session.is_live_at(now) {
            return Err(AccessError::SessionClosed);
        }

        self.activity.apply_activity(&session, &update, now).await
    }

    pub async fn record_screen_access(
        &self,
        session_id: StaffSessionId,
        screen_name: &str,
        duration_minutes: f64,
    ) -> AccessResult<ActivityRecord> {
        self.record(
            session_id,
            ActivityUpdate::ScreenAccess {
                screen_name: screen_name.to_string(),
                duration_minutes,
            },
        )
        .await
    }

    pub async fn record_task_completion(
        &self,
        session_id: StaffSessionId,
        task_name: &str,
        success: bool,
        details: Option<serde_json::Value>,
    ) -> AccessResult<ActivityRecord> {
        self.record(
            session_id,
            ActivityUpdate::TaskCompletion {
                task_name: task_name.to_string(),
                success,
                details,
            },
        )
        .await
    }

    pub async fn add_active_minutes(
        &self,
        session_id: StaffSessionId,
        minutes: f64,
    ) -> AccessResult<ActivityRecord> {
        self.record(session_id, ActivityUpdate::ActiveTime { minutes })
            .await
    }

    pub async fn add_break_minutes(
        &self,
        session_id: StaffSessionId,
        minutes: f64,
    ) -> AccessResult<ActivityRecord> {
        self.record(session_id, ActivityUpdate::BreakTime { minutes })
            .await
    }

    /// Derive the productivity score from the stored record
    ///
    /// Works on ended sessions too; their records are read-only, not gone.
    pub async fn recompute_productivity_score(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<f64> {
        Ok(self.summary(session_id).await?.productivity_score)
    }

    /// Record and score for a session. Sessions without updates yet get an
    /// empty record.
    pub async fn summary(&self, session_id: StaffSessionId) -> AccessResult<ActivitySummary> {
        let record = match self.activity.find_activity(session_id).await? {
            Some(record) => record,
            None => {
                let session = self.session(session_id).await?;
                ActivityRecord::empty(
                    session.id,
                    session.staff_id,
                    session.owner_id,
                    session.signed_in_at,
                )
            }
        };

        Ok(ActivitySummary {
            productivity_score: productivity_score(&record),
            record,
        })
    }

    async fn session(&self, session_id: StaffSessionId) -> AccessResult<StaffSession> {
        self.sessions
            .find_staff_session(session_id)
            .await?
            .ok_or(AccessError::NotFound("staff session"))
    }
}
