//! Staff login, sign-out and the staff-mode exit.

use axum::{
    Json,
    extract::{Extension, Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shift_gate::{
    AccessError,
    clock::Clock,
    gate::{AFTER_STAFF_LOGIN, GateDecision, ResolvedContext},
    staff::{SessionSelector, StaffLoginRequest, StaffSessionId, TerminatedSession, Terminator},
};
use uuid::Uuid;

use super::{
    AppState,
    errors::ApiResult,
    middleware::{Client, STAFF_COOKIE, cookie},
    request_id::RequestId,
    scoped_owner,
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLoginPayload {
    pub business_id: Uuid,
    pub staff_id: Uuid,
    pub pin: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StaffLogoutPayload {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutPayload {
    pub session_id: StaffSessionId,
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSignoutPayload {
    pub session_ids: Vec<StaffSessionId>,
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessScope {
    pub business_id: Option<Uuid>,
}

/// Staff PIN login into the owner's open shift.
///
/// Sets `sg_staff` and clears `sg_admin`: entering staff mode leaves admin mode.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown staff member or wrong PIN (indistinguishable)
/// - `409 Conflict`: `NO_ACTIVE_SHIFT` or `CAPACITY_EXCEEDED`
/// - `429 Too Many Requests`: Locked out after repeated failures
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    request_id: RequestId,
    Json(payload): Json<StaffLoginPayload>,
) -> ApiResult<Response> {
    let request = StaffLoginRequest {
        owner_id: payload.business_id,
        staff_id: payload.staff_id,
        pin: payload.pin,
    };

    let issued = match state.services.staff.login(request, &client).await {
        Ok(issued) => issued,
        Err(e) => {
            metrics::login_attempts_total("staff", e.code());
            if matches!(
                e,
                AccessError::InvalidCredential
                    | AccessError::NotFound(_)
                    | AccessError::RateLimited { .. }
            ) {
                log_security_event(
                    "staff_login_failed",
                    Some(payload.business_id),
                    client.ip_address.as_deref(),
                    &format!("{} (request {})", e.code(), request_id.as_str()),
                );
            }
            return Err(e.into());
        }
    };
    metrics::login_attempts_total("staff", "success");

    let max_age = (issued.session.expires_at - state.services.clock.now()).num_seconds();
    let mut response = Json(json!({
        "token": issued.token,
        "session": issued.session,
    }))
    .into_response();

    let headers = response.headers_mut();
    if let Some(cookie) = state.cookies.set(STAFF_COOKIE, &issued.token, max_age) {
        headers.append(SET_COOKIE, cookie);
    }
    state.cookies.apply(&AFTER_STAFF_LOGIN, headers);
    Ok(response)
}

/// Staff self sign-out. Idempotent; always clears `sg_staff`.
pub async fn logout(
    State(state): State<AppState>,
    Client(client): Client,
    headers: HeaderMap,
    payload: Option<Json<StaffLogoutPayload>>,
) -> ApiResult<Response> {
    let token = payload
        .and_then(|Json(p)| p.token)
        .filter(|t| !t.is_empty())
        .or_else(|| cookie(&headers, STAFF_COOKIE));

    let ended = match token {
        Some(token) => state.services.staff.logout(&token, &client).await?,
        None => None,
    };

    let mut response = Json(json!({
        "ok": true,
        "duration_secs": ended.map(|t| t.duration_secs),
    }))
    .into_response();
    if let Some(clear) = state.cookies.clear(STAFF_COOKIE) {
        response.headers_mut().append(SET_COOKIE, clear);
    }
    Ok(response)
}

/// Leave staff mode for the owner login boundary.
///
/// Ends the live staff session, clears every session cookie and redirects to
/// owner login.
pub async fn switch_to_admin(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
) -> ApiResult<Response> {
    let (terminated, decision) = state
        .services
        .gate
        .switch_to_admin(&resolved, &client)
        .await?;

    if let Some(terminated) = &terminated {
        tracing::info!(
            session_id = %terminated.session.id,
            duration_secs = terminated.duration_secs,
            "Staff session ended for switch to admin"
        );
    }

    let mut response = match &decision {
        GateDecision::Redirect { to, .. } => Redirect::to(to).into_response(),
        _ => Json(json!({ "ok": true })).into_response(),
    };
    state
        .cookies
        .apply(decision.directives(), response.headers_mut());
    Ok(response)
}

/// Live staff sessions of the calling owner
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Query(scope): Query<BusinessScope>,
) -> ApiResult<Json<Value>> {
    let owner_id = scoped_owner(&resolved, scope.business_id)?;
    let sessions = state.services.staff.list_live(owner_id).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

async fn owner_signout(
    state: &AppState,
    resolved: &ResolvedContext,
    business_id: Option<Uuid>,
    selector: SessionSelector,
    client: &shift_gate::auth::ClientInfo,
) -> ApiResult<Json<Value>> {
    let owner_id = scoped_owner(resolved, business_id)?;
    let terminated: Vec<TerminatedSession> = state
        .services
        .staff
        .terminate(owner_id, selector, Terminator::Owner(owner_id), client)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "terminated": terminated,
    })))
}

/// Owner signs one staff session out
pub async fn signout(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
    Json(payload): Json<SignoutPayload>,
) -> ApiResult<Json<Value>> {
    owner_signout(
        &state,
        &resolved,
        payload.business_id,
        SessionSelector::One(payload.session_id),
        &client,
    )
    .await
}

/// Owner signs several staff sessions out
pub async fn bulk_signout(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
    Json(payload): Json<BulkSignoutPayload>,
) -> ApiResult<Json<Value>> {
    if payload.session_ids.is_empty() {
        return Err(AccessError::InvalidInput("sessionIds must not be empty".to_string()).into());
    }
    owner_signout(
        &state,
        &resolved,
        payload.business_id,
        SessionSelector::Many(payload.session_ids),
        &client,
    )
    .await
}

/// Owner signs every staff session out
pub async fn signout_all(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Client(client): Client,
    payload: Option<Json<BusinessScope>>,
) -> ApiResult<Json<Value>> {
    let scope = payload.map(|Json(p)| p).unwrap_or_default();
    owner_signout(
        &state,
        &resolved,
        scope.business_id,
        SessionSelector::AllForOwner,
        &client,
    )
    .await
}
