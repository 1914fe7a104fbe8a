//! Admin elevation endpoints.

use axum::{
    Json,
    extract::{Extension, Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shift_gate::{
    admin::ElevationRequest,
    clock::Clock,
    gate::{AFTER_ADMIN_LOGIN, ResolvedContext},
};
use uuid::Uuid;

use super::{
    AppState, elevated,
    errors::ApiResult,
    middleware::{ADMIN_COOKIE, Client, cookie},
    owner::BusinessInfo,
    scoped_owner,
};
use crate::{logging::log_security_event, metrics};

const DEFAULT_AUDIT_LIMIT: i64 = 100;
const MAX_AUDIT_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginPayload {
    pub email: String,
    pub password: String,
    pub admin_pin: String,
    pub required_for: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenPayload {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub business_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Explicit token, falling back to the admin cookie
fn admin_token(explicit: Option<String>, headers: &HeaderMap) -> Option<String> {
    explicit
        .filter(|t| !t.is_empty())
        .or_else(|| cookie(headers, ADMIN_COOKIE))
}

/// Verify password and admin PIN and issue an elevated session.
///
/// Sets `sg_admin` and clears `sg_staff`: entering admin mode leaves staff mode.
///
/// # Errors
///
/// - `400 Bad Request`: Missing `requiredFor`
/// - `401 Unauthorized`: Any credential failure, without saying which factor
/// - `429 Too Many Requests`: Locked out after repeated failures
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<AdminLoginPayload>,
) -> ApiResult<Response> {
    let request = ElevationRequest {
        email: payload.email,
        password: payload.password,
        admin_pin: payload.admin_pin,
        required_for: payload.required_for,
    };

    let issued = match state.services.admin.request_elevation(request, &client).await {
        Ok(issued) => issued,
        Err(e) => {
            metrics::login_attempts_total("admin", e.code());
            log_security_event(
                "admin_login_failed",
                None,
                client.ip_address.as_deref(),
                &e.to_string(),
            );
            return Err(e.into());
        }
    };
    metrics::login_attempts_total("admin", "success");

    let max_age = (issued.session.expires_at - state.services.clock.now()).num_seconds();
    let mut response = Json(json!({
        "token": issued.token,
        "session": issued.session,
        "business": BusinessInfo::from(&issued.owner),
        "user": {
            "email": issued.owner.email,
            "display_name": issued.owner.display_name,
        },
    }))
    .into_response();

    let headers = response.headers_mut();
    if let Some(cookie) = state.cookies.set(ADMIN_COOKIE, &issued.token, max_age) {
        headers.append(SET_COOKIE, cookie);
    }
    state.cookies.apply(&AFTER_ADMIN_LOGIN, headers);
    Ok(response)
}

/// Whether an elevation token is still valid.
///
/// Takes `?token=` or the `sg_admin` cookie. Never extends the session.
pub async fn session(
    State(state): State<AppState>,
    Query(query): Query<TokenPayload>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let session = match admin_token(query.token, &headers) {
        Some(token) => state.services.admin.validate(&token).await?,
        None => None,
    };

    Ok(Json(json!({
        "valid": session.is_some(),
        "session": session,
    })))
}

/// End an elevation. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    Client(client): Client,
    headers: HeaderMap,
    payload: Option<Json<TokenPayload>>,
) -> ApiResult<Response> {
    let explicit = payload.and_then(|Json(p)| p.token);
    if let Some(token) = admin_token(explicit, &headers) {
        state.services.admin.end(&token, &client).await?;
    }

    let mut response = Json(json!({ "ok": true })).into_response();
    if let Some(clear) = state.cookies.clear(ADMIN_COOKIE) {
        response.headers_mut().append(SET_COOKIE, clear);
    }
    Ok(response)
}

/// Valid elevations of the calling owner
pub async fn active_sessions(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
) -> ApiResult<Json<Value>> {
    let owner_id = elevated(&resolved)?.owner_id;
    let sessions = state.services.admin.active_sessions(owner_id).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// Most recent audit events, newest first
pub async fn audit(
    State(state): State<AppState>,
    Extension(resolved): Extension<ResolvedContext>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Value>> {
    let owner_id = scoped_owner(&resolved, query.business_id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let events = state.services.audit.recent(owner_id, limit).await?;
    Ok(Json(json!({ "events": events })))
}
