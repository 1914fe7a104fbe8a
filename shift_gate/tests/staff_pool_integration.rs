//! Integration tests for staff login, validation and sign-out.

mod common;

use chrono::Duration;
use common::{Harness, client};
use shift_gate::{
    AccessError,
    audit::AuditEventType,
    config::LockoutConfig,
    staff::{SessionSelector, StaffLoginRequest, TerminationReason, Terminator},
};
use uuid::Uuid;

#[tokio::test]
async fn test_login_requires_active_shift() {
    let h = Harness::new().await;
    let staff = h.add_staff("Emery", "555555").await;

    assert!(matches!(h.login(&staff).await, Err(AccessError::NoActiveShift)));

    let rejected = h.events_of(AuditEventType::StaffLoginRejected).await;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].detail["reason"], "no_active_shift");
}

#[tokio::test]
async fn test_login_issues_distinct_tokens() {
    let h = Harness::new().await;
    let shift = h.start_shift("Lunch", 10, None).await;
    let staff = h.add_staff("Finley", "666666").await;

    let first = h.login(&staff).await.unwrap();
    let second = h.login(&staff).await.unwrap();
    assert_ne!(first.token, second.token);
    assert_eq!(first.session.shift_id, Some(shift.id));
    assert_eq!(
        first.session.expires_at,
        first.session.signed_in_at + Duration::hours(12)
    );

    // Only digests are stored
    assert!(
        h.store
            .all_staff_sessions()
            .await
            .iter()
            .all(|s| s.token_hash != first.token && s.token_hash != second.token)
    );
    assert_eq!(h.events_of(AuditEventType::StaffLoginSuccess).await.len(), 2);
}

#[tokio::test]
async fn test_wrong_pin_and_unknown_staff() {
    let h = Harness::new().await;
    h.start_shift("Lunch", 10, None).await;
    let staff = h.add_staff("Gray", "777777").await;

    let mut request = h.login_request(&staff);
    request.pin = "000000".to_string();
    let wrong = h.services.staff.login(request, &client()).await;
    assert!(matches!(wrong, Err(AccessError::InvalidCredential)));

    let unknown = h
        .services
        .staff
        .login(
            StaffLoginRequest {
                owner_id: h.owner.id,
                staff_id: Uuid::new_v4(),
                pin: "777777".to_string(),
            },
            &client(),
        )
        .await;
    let err = unknown.unwrap_err();
    assert!(matches!(err, AccessError::NotFound(_)));
    assert_eq!(err.client_message(), AccessError::InvalidCredential.client_message());

    assert_eq!(h.events_of(AuditEventType::StaffLoginFailed).await.len(), 2);
    assert!(h.store.all_staff_sessions().await.is_empty());
}

#[tokio::test]
async fn test_staff_pin_lockout() {
    let h = Harness::with_lockout(LockoutConfig {
        max_failures: 2,
        window_secs: 300,
    })
    .await;
    h.start_shift("Lunch", 10, None).await;
    let staff = h.add_staff("Harper", "888888").await;
    let other = h.add_staff("Indigo", "999999").await;

    for _ in 0..2 {
        let mut request = h.login_request(&staff);
        request.pin = "123123".to_string();
        assert!(h.services.staff.login(request, &client()).await.is_err());
    }

    assert!(matches!(
        h.login(&staff).await,
        Err(AccessError::RateLimited { .. })
    ));
    // Lockout is per staff member
    h.login(&other).await.unwrap();
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = Harness::new().await;
    h.start_shift("Lunch", 10, None).await;
    let staff = h.add_staff("Jules", "121212").await;
    let issued = h.login(&staff).await.unwrap();

    h.clock.advance(Duration::minutes(45));
    let ended = h
        .services
        .staff
        .logout(&issued.token, &client())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ended.duration_secs, 2700);
    assert_eq!(
        ended.session.termination_reason,
        Some(TerminationReason::SelfSignout)
    );

    assert!(
        h.services
            .staff
            .logout(&issued.token, &client())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        h.services
            .staff
            .logout("not-a-token", &client())
            .await
            .unwrap()
            .is_none()
    );

    assert_eq!(h.events_of(AuditEventType::StaffSignout).await.len(), 1);
    assert!(h.services.staff.validate(&issued.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_owner_signout_one_many_all() {
    let h = Harness::new().await;
    h.start_shift("Dinner", 10, None).await;
    let mut sessions = Vec::new();
    for (name, pin) in [
        ("K", "200001"),
        ("L", "200002"),
        ("M", "200003"),
        ("N", "200004"),
        ("O", "200005"),
    ] {
        let staff = h.add_staff(name, pin).await;
        sessions.push(h.login(&staff).await.unwrap().session);
    }
    let by_owner = Terminator::Owner(h.owner.id);

    let one = h
        .services
        .staff
        .terminate(h.owner.id, SessionSelector::One(sessions[0].id), by_owner, &client())
        .await
        .unwrap();
    assert_eq!(one.len(), 1);

    // Already-ended sessions in a bulk request are skipped
    let many = h
        .services
        .staff
        .terminate(
            h.owner.id,
            SessionSelector::Many(vec![sessions[0].id, sessions[1].id, sessions[2].id]),
            by_owner,
            &client(),
        )
        .await
        .unwrap();
    assert_eq!(many.len(), 2);

    let all = h
        .services
        .staff
        .terminate(h.owner.id, SessionSelector::AllForOwner, by_owner, &client())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(h.services.staff.list_live(h.owner.id).await.unwrap().is_empty());

    assert_eq!(h.events_of(AuditEventType::StaffSignoutByOwner).await.len(), 1);
    assert_eq!(h.events_of(AuditEventType::StaffBulkSignoutByOwner).await.len(), 2);
    let all_events = h.events_of(AuditEventType::StaffSignoutAllByOwner).await;
    assert_eq!(all_events.len(), 2);
    assert!(all_events.iter().all(|e| e.actor_user_id == Some(h.owner.id)));

    // Repeating a single sign-out is a no-op, not an error
    let again = h
        .services
        .staff
        .terminate(h.owner.id, SessionSelector::One(sessions[0].id), by_owner, &client())
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_signout_of_unknown_session_is_not_found() {
    let h = Harness::new().await;
    let result = h
        .services
        .staff
        .terminate(
            h.owner.id,
            SessionSelector::One(Uuid::new_v4()),
            Terminator::Owner(h.owner.id),
            &client(),
        )
        .await;
    assert!(matches!(result, Err(AccessError::NotFound(_))));
}

#[tokio::test]
async fn test_session_expires_after_ttl() {
    let h = Harness::new().await;
    h.start_shift("Overnight", 10, None).await;
    let staff = h.add_staff("Parker", "343434").await;
    let issued = h.login(&staff).await.unwrap();

    h.clock.advance(Duration::hours(12) - Duration::seconds(1));
    assert!(h.services.staff.validate(&issued.token).await.unwrap().is_some());
    h.clock.advance(Duration::seconds(1));
    assert!(h.services.staff.validate(&issued.token).await.unwrap().is_none());

    // An expired session no longer holds a capacity slot
    let status = h.services.shifts.status(h.owner.id).await.unwrap();
    assert_eq!(status.active_staff_count, 0);
}

#[tokio::test]
async fn test_every_transition_is_audited() {
    let h = Harness::new().await;
    h.start_shift("Evening", 1, None).await;
    let a = h.add_staff("Quinn", "565656").await;
    let b = h.add_staff("Reese", "787878").await;

    let issued = h.login(&a).await.unwrap();
    let _ = h.login(&b).await;
    h.services.staff.logout(&issued.token, &client()).await.unwrap();
    h.login(&b).await.unwrap();

    let types: Vec<_> = h.events().await.into_iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            AuditEventType::ShiftStarted,
            AuditEventType::StaffLoginSuccess,
            AuditEventType::StaffLoginRejected,
            AuditEventType::StaffSignout,
            AuditEventType::StaffLoginSuccess,
        ]
    );
}
