//! Shift endpoints.

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shift_gate::{
    gate::ResolvedContext,
    shift::{ShiftStatus, ShiftTarget, StartShiftRequest},
};
use uuid::Uuid;

use super::{AppState, elevated, errors::ApiResult, middleware::Client, scoped_owner};
use crate::metrics;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftPayload {
    pub shift_name: String,
    pub max_staff_sessions: Option<u32>,
    pub auto_end_hours: Option<u32>,
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndShiftPayload {
    /// Omitted: end every active shift of the owner
    pub shift_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub business_id: Uuid,
}

/// Open a shift. Requires elevation.
///
/// # Errors
///
/// - `400 Bad Request`: Blank name, zero capacity or zero auto-end hours
/// - `409 Conflict`: A shift is already active
pub async fn start(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
    Json(payload): Json<StartShiftPayload>,
) -> ApiResult<Json<Value>> {
    let owner_id = scoped_owner(&resolved, payload.business_id)?;
    let started_by = elevated(&resolved)?.issued_by.clone();

    let shift = state
        .services
        .shifts
        .start(
            owner_id,
            &started_by,
            StartShiftRequest {
                name: payload.shift_name,
                max_staff_sessions: payload.max_staff_sessions,
                auto_end_hours: payload.auto_end_hours,
            },
            &client,
        )
        .await?;

    tracing::info!(owner_id = %owner_id, shift_id = %shift.id, "Shift started");
    Ok(Json(json!({ "shift": shift })))
}

/// End one shift, or all active shifts when `shiftId` is omitted.
///
/// Every staff session of an ended shift is signed out in the same step.
/// Ending a shift that already ended succeeds with nothing terminated.
pub async fn end(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
    payload: Option<Json<EndShiftPayload>>,
) -> ApiResult<Json<Value>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let owner_id = scoped_owner(&resolved, payload.business_id)?;
    let ended_by = elevated(&resolved)?.issued_by.clone();

    let target = match payload.shift_id {
        Some(shift_id) => ShiftTarget::One(shift_id),
        None => ShiftTarget::AllActive,
    };
    let ended = state
        .services
        .shifts
        .end(owner_id, target, &ended_by, &client)
        .await?;

    let sessions_terminated: usize = ended.iter().map(|e| e.terminated.len()).sum();
    metrics::shift_cascade_sessions(sessions_terminated);

    Ok(Json(json!({
        "ok": true,
        "ended_shifts": ended.iter().map(|e| e.shift.id).collect::<Vec<_>>(),
        "sessions_terminated": sessions_terminated,
    })))
}

/// Shift snapshot for a business. Public: staff login screens poll it.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<ShiftStatus>> {
    Ok(Json(state.services.shifts.status(query.business_id).await?))
}
