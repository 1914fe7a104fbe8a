//! Integration tests for activity telemetry.

mod common;

use chrono::Duration;
use common::{Harness, client};
use serde_json::json;
use shift_gate::AccessError;
use uuid::Uuid;

#[tokio::test]
async fn test_activity_accumulates_and_scores() {
    let h = Harness::new().await;
    h.start_shift("Evening", 5, None).await;
    let staff = h.add_staff("Val", "131313").await;
    let session = h.login(&staff).await.unwrap().session;
    let telemetry = &h.services.activity;

    let empty = telemetry.summary(session.id).await.unwrap();
    assert_eq!(empty.productivity_score, 0.0);

    telemetry.record_screen_access(session.id, "orders", 12.5).await.unwrap();
    telemetry.record_screen_access(session.id, "orders", 3.0).await.unwrap();
    telemetry
        .record_task_completion(session.id, "close_till", true, Some(json!({ "till": 2 })))
        .await
        .unwrap();
    telemetry
        .record_task_completion(session.id, "restock", false, None)
        .await
        .unwrap();
    telemetry.add_active_minutes(session.id, 60.0).await.unwrap();
    let record = telemetry.add_break_minutes(session.id, 15.0).await.unwrap();

    assert_eq!(record.screen_visits.len(), 2);
    assert_eq!(record.task_outcomes.len(), 2);
    assert_eq!(record.active_minutes, 60.0);
    assert_eq!(record.break_minutes, 15.0);

    let score = telemetry.recompute_productivity_score(session.id).await.unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(score > 0.0);
}

#[tokio::test]
async fn test_activity_rejected_after_session_ends() {
    let h = Harness::new().await;
    h.start_shift("Evening", 5, None).await;
    let staff = h.add_staff("Wren", "141414").await;
    let issued = h.login(&staff).await.unwrap();
    let telemetry = &h.services.activity;

    telemetry.add_active_minutes(issued.session.id, 30.0).await.unwrap();
    h.services.staff.logout(&issued.token, &client()).await.unwrap();

    assert!(matches!(
        telemetry.add_active_minutes(issued.session.id, 5.0).await,
        Err(AccessError::SessionClosed)
    ));
    // The record stays readable
    let summary = telemetry.summary(issued.session.id).await.unwrap();
    assert_eq!(summary.record.active_minutes, 30.0);
}

#[tokio::test]
async fn test_activity_rejected_after_expiry() {
    let h = Harness::new().await;
    h.start_shift("Evening", 5, Some(1)).await;
    let staff = h.add_staff("Xan", "151515").await;
    let session = h.login(&staff).await.unwrap().session;

    h.clock.advance(Duration::hours(1));
    assert!(matches!(
        h.services.activity.add_active_minutes(session.id, 5.0).await,
        Err(AccessError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_activity_input_validation() {
    let h = Harness::new().await;
    h.start_shift("Evening", 5, None).await;
    let staff = h.add_staff("Yael", "161616").await;
    let session = h.login(&staff).await.unwrap().session;
    let telemetry = &h.services.activity;

    assert!(matches!(
        telemetry.add_break_minutes(session.id, -1.0).await,
        Err(AccessError::InvalidInput(_))
    ));
    assert!(matches!(
        telemetry.record_screen_access(session.id, " ", 1.0).await,
        Err(AccessError::InvalidInput(_))
    ));
    assert!(matches!(
        telemetry.add_active_minutes(Uuid::new_v4(), 1.0).await,
        Err(AccessError::NotFound(_))
    ));
}
