//! Session activity telemetry.

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shift_gate::{
    AccessError,
    activity::{ActivitySummary, ActivityUpdate},
    gate::ResolvedContext,
    staff::StaffSessionId,
};

use super::{AppState, errors::ApiResult, scoped_owner};

/// `{sessionId, action, data}` as sent by staff devices
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub session_id: StaffSessionId,
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl ActivityPayload {
    fn update(&self) -> Result<ActivityUpdate, AccessError> {
        serde_json::from_value(json!({ "action": self.action, "data": self.data }))
            .map_err(|e| AccessError::InvalidInput(format!("invalid activity: {e}")))
    }
}

/// Record one telemetry event against the caller's own staff session
///
/// # Errors
///
/// - `400 Bad Request`: Unknown action, malformed data or negative minutes
/// - `401 Unauthorized`: Session id is not the caller's session
/// - `409 Conflict`: Session already closed
pub async fn record(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Json(payload): Json<ActivityPayload>,
) -> ApiResult<Json<ActivitySummary>> {
    match &resolved.staff {
        Some(session) if session.id == payload.session_id => {}
        _ => return Err(AccessError::NotFound("staff session").into()),
    }

    let update = payload.update()?;
    state
        .services
        .activity
        .record(payload.session_id, update)
        .await?;
    Ok(Json(state.services.activity.summary(payload.session_id).await?))
}

/// Activity record and freshly computed score, for the owner
pub async fn summary(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Path(session_id): Path<StaffSessionId>,
) -> ApiResult<Json<ActivitySummary>> {
    let owner_id = scoped_owner(&resolved, None)?;
    let summary = state.services.activity.summary(session_id).await?;
    if summary.record.owner_id != owner_id {
        return Err(AccessError::NotFound("staff session").into());
    }
    Ok(Json(summary))
}
