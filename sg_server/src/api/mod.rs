//! HTTP API for session and shift admission control.
//!
//! # Modules
//!
//! - [`owner`]: owner baseline login and business lookup
//! - [`admin`]: admin elevation login, validation, logout and listing
//! - [`shift`]: shift start, end and status
//! - [`staff`]: staff PIN login, logout, owner-initiated sign-outs, mode switch
//! - [`activity`]: per-session telemetry
//! - [`middleware`]: mode-exclusivity gate and cookie transport
//!
//! # Endpoints
//!
//! Everything except `/health` lives under `/api/v1`.
//!
//! ```text
//! GET  /health                            - Datastore health (public)
//! POST /owner/login                       - Owner baseline login (public)
//! GET  /business/{business_id}            - Business info (staff exit)
//! POST /admin/login                       - Admin elevation (public)
//! GET  /admin/session                     - Validate elevation (public)
//! POST /admin/logout                      - End elevation (public)
//! GET  /admin/active-sessions             - List elevations (admin)
//! GET  /shift/status?businessId=          - Shift snapshot (public)
//! POST /shift/start                       - Open a shift (admin)
//! POST /shift/end                         - End one or all shifts (admin)
//! POST /staff/login                       - Staff PIN login (public)
//! POST /staff/logout                      - Staff sign-out (staff exit)
//! POST /mode/switch-to-admin              - Leave staff mode (staff exit)
//! GET  /staff/sessions                    - Live staff sessions (owner)
//! POST /staff/sessions/signout            - Sign one session out (admin)
//! POST /staff/sessions/bulk-signout       - Sign several out (admin)
//! POST /staff/sessions/signout-all        - Sign everyone out (admin)
//! POST /session-activity                  - Record telemetry (staff)
//! GET  /session-activity/{session_id}     - Telemetry and score (owner)
//! GET  /audit?businessId=&limit=          - Recent audit events (admin)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sg_server::api::{AppState, create_router};
//! use sg_server::api::middleware::CookieSettings;
//! use shift_gate::{AccessServices, config::AccessPolicy};
//! use std::sync::Arc;
//! # async fn example(services: AccessServices) -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     services: Arc::new(services),
//!     database: None,
//!     cookies: CookieSettings { secure: true },
//!     policy: AccessPolicy::default(),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod admin;
pub mod errors;
pub mod middleware;
pub mod owner;
pub mod request_id;
pub mod shift;
pub mod staff;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use shift_gate::{
    AccessError, AccessServices, admin::AdminSession, auth::OwnerId, config::AccessPolicy,
    db::Database, gate::ResolvedContext,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use errors::{ApiError, ApiResult};
use middleware::CookieSettings;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<AccessServices>,
    /// Pool behind the services; `None` when running on the in-memory store
    pub database: Option<Database>,
    pub cookies: CookieSettings,
    pub policy: AccessPolicy,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id::request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Route groups, each behind the gate for its access class
fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/owner/login", post(owner::login))
        .route("/admin/login", post(admin::login))
        .route("/admin/session", get(admin::session))
        .route("/admin/logout", post(admin::logout))
        .route("/shift/status", get(shift::status))
        .route("/staff/login", post(staff::login))
        .layer(from_fn_with_state(state.clone(), middleware::public_gate));

    let staff_exit_routes = Router::new()
        .route("/business/{business_id}", get(owner::business))
        .route("/staff/logout", post(staff::logout))
        .route("/mode/switch-to-admin", post(staff::switch_to_admin))
        .layer(from_fn_with_state(state.clone(), middleware::staff_exit_gate));

    let staff_routes = Router::new()
        .route("/session-activity", post(activity::record))
        .layer(from_fn_with_state(state.clone(), middleware::staff_gate));

    let owner_routes = Router::new()
        .route("/staff/sessions", get(staff::list_sessions))
        .route("/session-activity/{session_id}", get(activity::summary))
        .layer(from_fn_with_state(state.clone(), middleware::owner_gate));

    let admin_routes = Router::new()
        .route("/admin/active-sessions", get(admin::active_sessions))
        .route("/shift/start", post(shift::start))
        .route("/shift/end", post(shift::end))
        .route("/staff/sessions/signout", post(staff::signout))
        .route("/staff/sessions/bulk-signout", post(staff::bulk_signout))
        .route("/staff/sessions/signout-all", post(staff::signout_all))
        .route("/audit", get(admin::audit))
        .layer(from_fn_with_state(state, middleware::admin_gate));

    Router::new()
        .merge(public_routes)
        .merge(staff_exit_routes)
        .merge(staff_routes)
        .merge(owner_routes)
        .merge(admin_routes)
}

/// Elevated session the admin gate let through
pub(crate) fn elevated(resolved: &ResolvedContext) -> ApiResult<&AdminSession> {
    resolved
        .admin
        .as_ref()
        .ok_or(ApiError(AccessError::InvalidCredential))
}

/// Owner the request acts for, checked against an explicit business id
pub(crate) fn scoped_owner(
    resolved: &ResolvedContext,
    business_id: Option<Uuid>,
) -> ApiResult<OwnerId> {
    let owner_id = resolved
        .owner_id()
        .ok_or(ApiError(AccessError::InvalidCredential))?;
    match business_id {
        Some(id) if id != owner_id => Err(ApiError(AccessError::NotFound("business"))),
        _ => Ok(owner_id),
    }
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the datastore answers, `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (store, healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store,
        "database": healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
