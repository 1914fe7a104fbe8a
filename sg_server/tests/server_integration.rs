//! Integration tests for the HTTP surface.
//!
//! The router runs over the in-memory store with a manual clock; requests go
//! through the full middleware stack via `oneshot`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sg_server::api::{self, AppState, middleware::CookieSettings};
use shift_gate::{
    AccessServices, ServiceSettings,
    auth::{CredentialVerifier, OwnerIdentity, StaffIdentity, StaffRole},
    clock::ManualClock,
    config::{AccessPolicy, CredentialConfig, LockoutConfig},
    db::MemoryStore,
};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

const OWNER_EMAIL: &str = "owner@harborbakery.test";
const OWNER_PASSWORD: &str = "sourdough starter 1987";
const ADMIN_PIN: &str = "135790";

struct TestApp {
    router: axum::Router,
    clock: ManualClock,
    owner_id: Uuid,
    staff: Vec<(Uuid, String)>,
}

async fn create_test_app(staff_count: usize) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(Utc::now());
    let credentials = CredentialConfig::insecure_fast("server_test_pepper");
    let verifier = CredentialVerifier::new(&credentials).unwrap();

    let owner_id = Uuid::new_v4();
    store
        .insert_owner(OwnerIdentity {
            id: owner_id,
            email: OWNER_EMAIL.to_string(),
            display_name: "Robin Baker".to_string(),
            business_name: "Harbor Bakery".to_string(),
            password_hash: verifier.hash(OWNER_PASSWORD).unwrap(),
            admin_pin_hash: Some(verifier.hash(ADMIN_PIN).unwrap()),
            created_at: clock_now(&clock),
        })
        .await;

    let mut staff = Vec::new();
    for i in 0..staff_count {
        let id = Uuid::new_v4();
        let pin = format!("{:04}", 1000 + i);
        store
            .insert_staff(StaffIdentity {
                id,
                owner_id,
                display_name: format!("Staff {i}"),
                pin_hash: verifier.hash(&pin).unwrap(),
                role: StaffRole::Cashier,
                is_active: true,
            })
            .await;
        staff.push((id, pin));
    }

    let policy = AccessPolicy::default();
    let services = AccessServices::new(
        store,
        Arc::new(clock.clone()),
        ServiceSettings {
            policy: policy.clone(),
            credentials,
            lockout: LockoutConfig::default(),
            jwt_secret: "server_integration_jwt_secret_32_chars".to_string(),
        },
    )
    .unwrap();

    let state = AppState {
        services: Arc::new(services),
        database: None,
        cookies: CookieSettings { secure: false },
        policy,
    };

    TestApp {
        router: api::create_router(state),
        clock,
        owner_id,
        staff,
    }
}

fn clock_now(clock: &ManualClock) -> chrono::DateTime<Utc> {
    use shift_gate::clock::Clock;
    clock.now()
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post(&self, uri: &str, cookies: &[(&str, &str)], body: Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie_header(cookies) {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, cookies: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie_header(cookies) {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn admin_login(&self) -> String {
        let response = self
            .post(
                "/api/v1/admin/login",
                &[],
                json!({
                    "email": OWNER_EMAIL,
                    "password": OWNER_PASSWORD,
                    "adminPin": ADMIN_PIN,
                    "requiredFor": "shift_management",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn start_shift(&self, admin_token: &str, max: u32) {
        let response = self
            .post(
                "/api/v1/shift/start",
                &[("sg_admin", admin_token)],
                json!({ "shiftName": "Morning bake", "maxStaffSessions": max }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn staff_login(&self, index: usize, pin: Option<&str>) -> Response<Body> {
        let (staff_id, real_pin) = &self.staff[index];
        self.post(
            "/api/v1/staff/login",
            &[],
            json!({
                "businessId": self.owner_id,
                "staffId": staff_id,
                "pin": pin.unwrap_or(real_pin),
            }),
        )
        .await
    }
}

fn cookie_header(cookies: &[(&str, &str)]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn clears(response: &Response<Body>, name: &str) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{name}=;")) && c.contains("Max-Age=0"))
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check_on_memory_store() {
    let app = create_test_app(0).await;

    let response = app.get("/health", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_owner_login_sets_cookie() {
    let app = create_test_app(0).await;

    let response = app
        .post(
            "/api/v1/owner/login",
            &[],
            json!({ "email": OWNER_EMAIL, "password": OWNER_PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("sg_owner=") && c.contains("HttpOnly"))
    );

    let body = json_body(response).await;
    assert_eq!(body["business"]["business_name"], "Harbor Bakery");

    let token = body["token"].as_str().unwrap();
    let response = app
        .get("/api/v1/staff/sessions", &[("sg_owner", token)])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["sessions"], json!([]));
}

#[tokio::test]
async fn test_owner_route_without_session_redirects_to_login() {
    let app = create_test_app(0).await;

    let response = app.get("/api/v1/staff/sessions", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/v1/owner/login"
    );
}

#[tokio::test]
async fn test_admin_login_sets_admin_cookie_and_clears_staff() {
    let app = create_test_app(0).await;

    let response = app
        .post(
            "/api/v1/admin/login",
            &[],
            json!({
                "email": OWNER_EMAIL,
                "password": OWNER_PASSWORD,
                "adminPin": ADMIN_PIN,
                "requiredFor": "staff_management",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("sg_admin=") && c.contains("Max-Age=900"))
    );
    assert!(clears(&response, "sg_staff"));

    let body = json_body(response).await;
    assert_eq!(body["session"]["required_for"], "staff_management");
}

#[tokio::test]
async fn test_admin_login_wrong_pin_is_unauthorized() {
    let app = create_test_app(0).await;

    let response = app
        .post(
            "/api/v1/admin/login",
            &[],
            json!({
                "email": OWNER_EMAIL,
                "password": OWNER_PASSWORD,
                "adminPin": "000000",
                "requiredFor": "shift_management",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_admin_route_requires_elevation() {
    let app = create_test_app(0).await;

    let response = app
        .post("/api/v1/shift/start", &[], json!({ "shiftName": "Late" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "ELEVATION_REQUIRED");
}

#[tokio::test]
async fn test_elevation_expires_after_fifteen_minutes() {
    let app = create_test_app(0).await;
    let token = app.admin_login().await;

    app.clock.advance(Duration::seconds(901));

    let response = app
        .get("/api/v1/admin/active-sessions", &[("sg_admin", &token)])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // The expired token is stale and gets cleared
    assert!(clears(&response, "sg_admin"));
}

#[tokio::test]
async fn test_staff_login_capacity_exceeded() {
    let app = create_test_app(2).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 1).await;

    let first = app.staff_login(0, None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(
        set_cookies(&first)
            .iter()
            .any(|c| c.starts_with("sg_staff="))
    );
    assert!(clears(&first, "sg_admin"));

    let second = app.staff_login(1, None).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(second).await["code"], "CAPACITY_EXCEEDED");
}

#[tokio::test]
async fn test_staff_login_without_shift() {
    let app = create_test_app(1).await;

    let response = app.staff_login(0, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "NO_ACTIVE_SHIFT");
}

#[tokio::test]
async fn test_unknown_staff_and_wrong_pin_are_indistinguishable() {
    let app = create_test_app(1).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;

    let wrong_pin = app.staff_login(0, Some("9999")).await;
    let unknown = app
        .post(
            "/api/v1/staff/login",
            &[],
            json!({
                "businessId": app.owner_id,
                "staffId": Uuid::new_v4(),
                "pin": "1000",
            }),
        )
        .await;

    assert_eq!(wrong_pin.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong_pin).await, json_body(unknown).await);
}

#[tokio::test]
async fn test_staff_mode_blocks_admin_routes() {
    let app = create_test_app(1).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;

    let login = app.staff_login(0, None).await;
    let staff_token = json_body(login).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    // A device still holding the admin cookie is in staff mode all the same
    let response = app
        .get(
            "/api/v1/admin/active-sessions",
            &[("sg_admin", &admin), ("sg_staff", &staff_token)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "STAFF_MODE_ACTIVE");
}

#[tokio::test]
async fn test_switch_to_admin_ends_staff_session() {
    let app = create_test_app(1).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;

    let login = app.staff_login(0, None).await;
    let staff_token = json_body(login).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post(
            "/api/v1/mode/switch-to-admin",
            &[("sg_staff", &staff_token)],
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/v1/owner/login"
    );
    for name in ["sg_staff", "sg_owner", "sg_admin"] {
        assert!(clears(&response, name), "{name} not cleared");
    }

    let status = app
        .get(
            &format!("/api/v1/shift/status?businessId={}", app.owner_id),
            &[],
        )
        .await;
    assert_eq!(json_body(status).await["active_staff_count"], 0);
}

#[tokio::test]
async fn test_staff_records_activity_for_own_session() {
    let app = create_test_app(1).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;

    let body = json_body(app.staff_login(0, None).await).await;
    let token = body["token"].as_str().unwrap().to_string();
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/api/v1/session-activity",
            &[("sg_staff", &token)],
            json!({
                "sessionId": session_id,
                "action": "active_time",
                "data": { "minutes": 30.0 },
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["active_minutes"], 30.0);

    let response = app
        .post(
            "/api/v1/session-activity",
            &[("sg_staff", &token)],
            json!({
                "sessionId": session_id,
                "action": "nap_time",
                "data": {},
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shift_end_signs_everyone_out() {
    let app = create_test_app(2).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;
    assert_eq!(app.staff_login(0, None).await.status(), StatusCode::OK);
    assert_eq!(app.staff_login(1, None).await.status(), StatusCode::OK);

    let response = app
        .post("/api/v1/shift/end", &[("sg_admin", &admin)], json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["sessions_terminated"], 2);

    let response = app
        .get(
            &format!("/api/v1/shift/status?businessId={}", app.owner_id),
            &[],
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body["is_active"], false);
    assert_eq!(body["active_staff_count"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app(0).await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-shift-42")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-shift-42"
    );
}

#[tokio::test]
async fn test_owner_signs_staff_out_and_reads_audit() {
    let app = create_test_app(1).await;
    let admin = app.admin_login().await;
    app.start_shift(&admin, 5).await;

    let body = json_body(app.staff_login(0, None).await).await;
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/api/v1/staff/sessions/signout",
            &[("sg_admin", &admin)],
            json!({ "sessionId": session_id, "businessId": app.owner_id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["terminated"].as_array().unwrap().len(), 1);

    // Another business id is treated as unknown
    let response = app
        .post(
            "/api/v1/staff/sessions/signout-all",
            &[("sg_admin", &admin)],
            json!({ "businessId": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get("/api/v1/audit?limit=1", &[("sg_admin", &admin)])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let events = json_body(response).await["events"].clone();
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["event_type"], "staff_signout_by_owner");
}
