//! Mode-exclusivity middleware and cookie transport.
//!
//! Every route group is wrapped in one of the `*_gate` middlewares. They read
//! the `sg_owner`, `sg_admin` and `sg_staff` cookies into a
//! [`ClientContext`], ask the [`ModeGate`](shift_gate::gate::ModeGate) for a
//! decision, and either run the handler with the [`ResolvedContext`] in the
//! request extensions or answer directly. Gate directives always become
//! `Set-Cookie` headers, whatever the outcome.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use shift_gate::gate::ResolvedContext;
//!
//! async fn handler(Extension(resolved): Extension<ResolvedContext>) -> String {
//!     format!("{:?}", resolved.mode())
//! }
//! # let _ = handler;
//! ```

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE, USER_AGENT},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use shift_gate::{
    auth::ClientInfo,
    gate::{ClientContext, DenyReason, Directive, GateDecision, RouteClass},
};

use super::{AppState, errors::ApiError, request_id::RequestId};
use crate::{logging::log_security_event, metrics};

/// Cookie carrying the owner baseline JWT
pub const OWNER_COOKIE: &str = "sg_owner";
/// Cookie carrying the admin elevation token
pub const ADMIN_COOKIE: &str = "sg_admin";
/// Cookie carrying the staff session token
pub const STAFF_COOKIE: &str = "sg_staff";

/// Cookie attributes shared by every session cookie
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value that stores `value` for `max_age_secs`
    pub fn set(&self, name: &str, value: &str, max_age_secs: i64) -> Option<HeaderValue> {
        let secure = if self.secure { "; Secure" } else { "" };
        HeaderValue::from_str(&format!(
            "{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}{secure}",
            max_age_secs.max(0)
        ))
        .ok()
    }

    /// `Set-Cookie` value that deletes the cookie
    pub fn clear(&self, name: &str) -> Option<HeaderValue> {
        self.set(name, "", 0)
    }

    /// Apply gate directives to a response
    pub fn apply(&self, directives: &[Directive], headers: &mut HeaderMap) {
        for directive in directives {
            let name = match directive {
                Directive::ClearStaffToken => STAFF_COOKIE,
                Directive::ClearOwnerSession => OWNER_COOKIE,
                Directive::ClearAdminToken => ADMIN_COOKIE,
            };
            if let Some(value) = self.clear(name) {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

/// Value of one cookie from the `Cookie` headers
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Tokens presented by the client
pub fn client_context(headers: &HeaderMap) -> ClientContext {
    ClientContext {
        owner_token: cookie(headers, OWNER_COOKIE),
        admin_token: cookie(headers, ADMIN_COOKIE),
        staff_token: cookie(headers, STAFF_COOKIE),
    }
}

/// Caller address and user agent, for the audit trail
#[derive(Debug, Clone)]
pub struct Client(pub ClientInfo);

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Client(client_info(&parts.headers)))
    }
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"));

    ClientInfo::new(ip_address, header(USER_AGENT.as_str()))
}

fn deny_message(reason: DenyReason) -> (&'static str, &'static str) {
    match reason {
        DenyReason::StaffModeActive => (
            "STAFF_MODE_ACTIVE",
            "Staff mode is active; switch to admin to continue",
        ),
        DenyReason::StaffSessionRequired => ("STAFF_SESSION_REQUIRED", "Staff login required"),
        DenyReason::ElevationRequired => ("ELEVATION_REQUIRED", "Admin elevation required"),
    }
}

async fn gate(route: RouteClass, state: AppState, mut request: Request, next: Next) -> Response {
    let ctx = client_context(request.headers());
    let (resolved, decision) = match state.services.gate.evaluate(route, &ctx).await {
        Ok(evaluated) => evaluated,
        Err(e) => return ApiError(e).into_response(),
    };

    let mut response = match &decision {
        GateDecision::Proceed { .. } => {
            request.extensions_mut().insert(resolved);
            next.run(request).await
        }
        GateDecision::Deny { reason, .. } => {
            let (code, message) = deny_message(*reason);
            let client = client_info(request.headers());
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default();
            log_security_event(
                "gate_denied",
                resolved.owner_id(),
                client.ip_address.as_deref(),
                &format!("{code} on {} (request {request_id})", request.uri().path()),
            );
            metrics::gate_denials_total(code);
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": message, "code": code })),
            )
                .into_response()
        }
        GateDecision::Redirect { to, .. } => Redirect::to(to).into_response(),
    };

    state
        .cookies
        .apply(decision.directives(), response.headers_mut());
    response
}

/// Login boundaries, health, read-only lookups
pub async fn public_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    gate(RouteClass::Public, state, request, next).await
}

/// Routes reachable from staff mode so the client can leave it
pub async fn staff_exit_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(RouteClass::StaffExit, state, request, next).await
}

/// Routes requiring a live staff session
pub async fn staff_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    gate(RouteClass::Staff, state, request, next).await
}

/// Routes requiring the owner baseline session
pub async fn owner_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    gate(RouteClass::Owner, state, request, next).await
}

/// Routes requiring a valid admin elevation
pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    gate(RouteClass::Admin, state, request, next).await
}
