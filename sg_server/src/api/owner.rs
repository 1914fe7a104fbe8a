//! Owner baseline login and business lookup.

use axum::{
    Json,
    extract::{Path, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shift_gate::{AccessError, auth::OwnerIdentity};
use uuid::Uuid;

use super::{
    AppState,
    errors::ApiResult,
    middleware::{Client, OWNER_COOKIE},
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct OwnerLoginPayload {
    pub email: String,
    pub password: String,
}

/// Public view of a business
#[derive(Debug, Serialize)]
pub struct BusinessInfo {
    pub id: Uuid,
    pub business_name: String,
    pub owner_name: String,
}

impl From<&OwnerIdentity> for BusinessInfo {
    fn from(owner: &OwnerIdentity) -> Self {
        Self {
            id: owner.id,
            business_name: owner.business_name.clone(),
            owner_name: owner.display_name.clone(),
        }
    }
}

/// Owner login with email and password.
///
/// Sets the `sg_owner` cookie and also returns the token for non-browser
/// clients.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `429 Too Many Requests`: Locked out after repeated failures
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    Json(payload): Json<OwnerLoginPayload>,
) -> ApiResult<Response> {
    let login = match state
        .services
        .owners
        .login(&payload.email, &payload.password, &client)
        .await
    {
        Ok(login) => login,
        Err(e) => {
            metrics::login_attempts_total("owner", e.code());
            log_security_event(
                "owner_login_failed",
                None,
                client.ip_address.as_deref(),
                &e.to_string(),
            );
            return Err(e.into());
        }
    };
    metrics::login_attempts_total("owner", "success");

    let mut response = Json(json!({
        "token": login.token,
        "business": BusinessInfo::from(&login.owner),
    }))
    .into_response();
    if let Some(cookie) = state.cookies.set(
        OWNER_COOKIE,
        &login.token,
        state.policy.owner_session_ttl.num_seconds(),
    ) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Business info for the login screens
///
/// Reachable from staff mode so a staff device can show whose till it is.
pub async fn business(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> ApiResult<Json<BusinessInfo>> {
    let owner = state
        .services
        .owners
        .business(business_id)
        .await?
        .ok_or(AccessError::NotFound("business"))?;
    Ok(Json(BusinessInfo::from(&owner)))
}
