//! Integration tests for admin elevation.

mod common;

use chrono::Duration;
use common::{ADMIN_PIN, Harness, OWNER_EMAIL, OWNER_PASSWORD, client};
use shift_gate::{
    AccessError,
    admin::ElevationRequest,
    audit::AuditEventType,
    config::LockoutConfig,
};

fn elevation(password: &str, pin: &str, required_for: &str) -> ElevationRequest {
    ElevationRequest {
        email: OWNER_EMAIL.to_string(),
        password: password.to_string(),
        admin_pin: pin.to_string(),
        required_for: required_for.to_string(),
    }
}

#[tokio::test]
async fn test_wrong_pin_is_rejected_and_audited_once() {
    let h = Harness::new().await;

    let result = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, "999999", "payroll"), &client())
        .await;
    assert!(matches!(result, Err(AccessError::InvalidCredential)));

    let failures = h.events_of(AuditEventType::AdminPinFailed).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].actor, "owner");
    assert_eq!(failures[0].ip_address.as_deref(), Some("203.0.113.7"));
    assert!(h.events_of(AuditEventType::AdminLoginSuccess).await.is_empty());
    assert!(h.store.all_admin_sessions().await.is_empty());
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let h = Harness::new().await;

    let result = h
        .services
        .admin
        .request_elevation(elevation("not it", ADMIN_PIN, "payroll"), &client())
        .await;
    assert!(matches!(result, Err(AccessError::InvalidCredential)));
    assert_eq!(h.events_of(AuditEventType::AdminPasswordFailed).await.len(), 1);
    assert!(h.events_of(AuditEventType::AdminPinFailed).await.is_empty());
}

#[tokio::test]
async fn test_unknown_email_looks_like_bad_password() {
    let h = Harness::new().await;
    let mut request = elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll");
    request.email = "nobody@cornercafe.test".to_string();

    let result = h.services.admin.request_elevation(request, &client()).await;
    assert!(matches!(result, Err(AccessError::InvalidCredential)));
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_blank_purpose_is_invalid_input() {
    let h = Harness::new().await;
    let result = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "   "), &client())
        .await;
    assert!(matches!(result, Err(AccessError::InvalidInput(_))));
}

#[tokio::test]
async fn test_elevation_expires_after_fifteen_minutes() {
    let h = Harness::new().await;
    let issued = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();

    assert_eq!(
        issued.session.expires_at - issued.session.created_at,
        Duration::minutes(15)
    );
    assert_eq!(issued.superseded, 0);

    h.clock.advance(Duration::seconds(899));
    assert!(h.services.admin.validate(&issued.token).await.unwrap().is_some());

    h.clock.advance(Duration::seconds(2));
    assert!(h.services.admin.validate(&issued.token).await.unwrap().is_none());
    assert!(h.services.admin.active_sessions(h.owner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_never_extends_the_session() {
    let h = Harness::new().await;
    let issued = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();

    for _ in 0..10 {
        h.clock.advance(Duration::minutes(1));
        let session = h.services.admin.validate(&issued.token).await.unwrap().unwrap();
        assert_eq!(session.expires_at, issued.session.expires_at);
    }
}

#[tokio::test]
async fn test_new_elevation_supersedes_same_purpose() {
    let h = Harness::new().await;
    let first = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();
    let other = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "inventory"), &client())
        .await
        .unwrap();
    let second = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();

    assert_eq!(second.superseded, 1);
    assert!(h.services.admin.validate(&first.token).await.unwrap().is_none());
    assert!(h.services.admin.validate(&second.token).await.unwrap().is_some());
    assert!(h.services.admin.validate(&other.token).await.unwrap().is_some());
    assert_eq!(h.services.admin.active_sessions(h.owner.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_end_is_idempotent() {
    let h = Harness::new().await;
    let issued = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();

    assert!(h.services.admin.end(&issued.token, &client()).await.unwrap());
    assert!(!h.services.admin.end(&issued.token, &client()).await.unwrap());
    assert!(!h.services.admin.end("never-issued", &client()).await.unwrap());

    assert_eq!(h.events_of(AuditEventType::AdminLogout).await.len(), 1);
    assert!(h.services.admin.validate(&issued.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_elevation_does_not_need_a_shift() {
    let h = Harness::new().await;
    assert!(!h.services.shifts.status(h.owner.id).await.unwrap().is_active);

    h.services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "settings"), &client())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeated_failures_lock_out() {
    let h = Harness::with_lockout(LockoutConfig {
        max_failures: 3,
        window_secs: 600,
    })
    .await;

    for _ in 0..3 {
        let result = h
            .services
            .admin
            .request_elevation(elevation(OWNER_PASSWORD, "000000", "payroll"), &client())
            .await;
        assert!(matches!(result, Err(AccessError::InvalidCredential)));
    }

    // Correct factors are refused while locked
    let locked = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await;
    assert!(matches!(
        locked,
        Err(AccessError::RateLimited {
            retry_after_secs: 600
        })
    ));

    h.clock.advance(Duration::seconds(601));
    h.services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_recent_audit_events_newest_first() {
    let h = Harness::new().await;

    let _ = h
        .services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, "999999", "payroll"), &client())
        .await;
    h.clock.advance(Duration::seconds(10));
    h.services
        .admin
        .request_elevation(elevation(OWNER_PASSWORD, ADMIN_PIN, "payroll"), &client())
        .await
        .unwrap();

    let latest = h.services.audit.recent(h.owner.id, 1).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].event_type, AuditEventType::AdminLoginSuccess);

    let all = h.services.audit.recent(h.owner.id, 50).await.unwrap();
    let types: Vec<_> = all.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![AuditEventType::AdminLoginSuccess, AuditEventType::AdminPinFailed]
    );
    assert!(all[0].created_at > all[1].created_at);

    let other_owner = h.services.audit.recent(uuid::Uuid::new_v4(), 50).await.unwrap();
    assert!(other_owner.is_empty());
}
