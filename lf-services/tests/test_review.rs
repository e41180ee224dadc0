//! Integration tests for the report status lifecycle.

mod common;

use common::create_test_registry;
use lf_core::constants::tables;
use lf_core::error::LfError;
use lf_models::{Actor, ReportKind, ReportStatus};

fn status_of(rows: &[serde_json::Value], id: &str) -> String {
    rows.iter()
        .find(|r| r["id"] == id)
        .and_then(|r| r["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_verify_writes_status_log_and_notification() {
    let (mut reg, backend, _dir) = create_test_registry();
    let actor = Actor::Security("s1".into());

    let outcome = reg
        .review
        .transition(ReportKind::Lost, "l1", ReportStatus::Verified, Some("ID checked"), &actor)
        .await
        .unwrap();
    assert_eq!(outcome.previous, ReportStatus::Reported);
    assert_eq!(outcome.report.status, ReportStatus::Verified);
    assert!(outcome.log_written);

    assert_eq!(status_of(&backend.rows(tables::LOST_ITEMS), "l1"), "verified");
    let logs = backend.rows(tables::ACTIVITY_LOGS);
    let entry = logs.last().unwrap();
    assert_eq!(entry["action"], "Lost item \"Black Wallet\" verified: ID checked");
    assert_eq!(entry["security_id"], "s1");

    assert_eq!(reg.dispatch_events(), 1);
    let inbox = reg.notifications.list("u1").unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(
        inbox[0].message,
        "Your lost item 'Black Wallet' has been verified by security."
    );
    assert_eq!(inbox[0].item_id.as_deref(), Some("l1"));
}

#[tokio::test]
async fn test_returned_report_is_closed() {
    let (reg, backend, _dir) = create_test_registry();
    let before = backend.rows(tables::ACTIVITY_LOGS).len();

    for target in ReportStatus::ALL {
        let err = reg
            .review
            .transition(ReportKind::Lost, "l3", target, None, &Actor::Security("s1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, LfError::ReportClosed(_)));
    }
    assert_eq!(status_of(&backend.rows(tables::LOST_ITEMS), "l3"), "returned");
    assert_eq!(backend.rows(tables::ACTIVITY_LOGS).len(), before);
}

#[tokio::test]
async fn test_backward_transition_refused() {
    let (reg, _backend, _dir) = create_test_registry();
    let err = reg
        .review
        .transition(
            ReportKind::Found,
            "f2",
            ReportStatus::Verified,
            None,
            &Actor::Security("s1".into()),
        )
        .await
        .unwrap_err();
    match err {
        LfError::InvalidTransition { from, to } => {
            assert_eq!(from, "matched");
            assert_eq!(to, "verified");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_report() {
    let (reg, _backend, _dir) = create_test_registry();
    let err = reg
        .review
        .transition(
            ReportKind::Lost,
            "nope",
            ReportStatus::Verified,
            None,
            &Actor::Security("s1".into()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LfError::NotFound(_)));
}

#[tokio::test]
async fn test_failed_log_write_keeps_status() {
    let (mut reg, backend, _dir) = create_test_registry();
    backend.fail_table(tables::ACTIVITY_LOGS);

    let outcome = reg
        .review
        .transition(
            ReportKind::Found,
            "f1",
            ReportStatus::Matched,
            None,
            &Actor::Security("s1".into()),
        )
        .await
        .unwrap();
    assert!(!outcome.log_written);
    assert_eq!(status_of(&backend.rows(tables::FOUND_ITEMS), "f1"), "matched");

    assert_eq!(reg.dispatch_events(), 1);
    assert_eq!(reg.notifications.unread_count("u2").unwrap(), 1);
}

#[tokio::test]
async fn test_admin_mark_returned() {
    let (reg, backend, _dir) = create_test_registry();
    let outcome = reg
        .review
        .mark_returned(ReportKind::Lost, "l2", "a1")
        .await
        .unwrap();
    assert_eq!(outcome.report.status, ReportStatus::Returned);

    let logs = backend.rows(tables::ACTIVITY_LOGS);
    let entry = logs.last().unwrap();
    assert_eq!(entry["admin_id"], "a1");
    assert_eq!(
        entry["action"],
        "Lost item \"Laptop Charger\" marked as returned to owner"
    );
}

#[tokio::test]
async fn test_pending_reports_and_stats() {
    let (reg, _backend, _dir) = create_test_registry();

    let pending = reg.review.pending_reports().await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["f1", "l1"]);
    assert_eq!(pending[0].reporter_display(), "Budi Santoso");
    assert_eq!(pending[1].reporter_display(), "Ana Putri");

    let stats = reg.review.security_stats().await.unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.lost, 3);
    assert_eq!(stats.found, 2);
    assert_eq!(stats.by_status.get(ReportStatus::Reported), 2);
    assert_eq!(stats.by_status.get(ReportStatus::Returned), 1);

    let activity = reg.review.recent_activity(5).await.unwrap();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0].performer(), "Pak Joko");
    assert_eq!(activity[1].performer(), "Admin Kampus");
}
