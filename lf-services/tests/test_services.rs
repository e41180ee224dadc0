//! Integration tests for auth, submission, search and notifications.

mod common;

use chrono::NaiveDate;

use common::{create_test_registry, seeded_backend};
use lf_core::constants::tables;
use lf_core::error::LfError;
use lf_models::{
    ImageUpload, NewNotification, NotificationKind, ReportForm, ReportKind, ReportStatus, Role,
};
use lf_services::search::filter_reports;
use lf_services::SearchParams;

fn form(images: Vec<ImageUpload>) -> ReportForm {
    ReportForm {
        kind: ReportKind::Lost,
        title: "Grey Backpack".into(),
        category: "accessories".into(),
        description: "Grey backpack with a laptop inside".into(),
        location: "Auditorium".into(),
        date: NaiveDate::from_ymd_opt(2024, 3, 10),
        images,
    }
}

fn png(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.into(),
        content_type: "image/png".into(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sign_in_persists_single_session() {
    let (reg, _backend, _dir) = create_test_registry();

    let session = reg.auth.sign_in("ana", "secret1", Role::User).await.unwrap();
    assert_eq!(session.account_id, "u1");
    assert_eq!(reg.auth.current().unwrap().unwrap().username, "ana");

    reg.auth.sign_in("satpam1", "guard123", Role::Security).await.unwrap();
    let current = reg.auth.current().unwrap().unwrap();
    assert_eq!(current.role, Role::Security);

    assert!(reg.auth.require(&[Role::Security, Role::Admin], "security").is_ok());
    let err = reg.auth.require(&[Role::Admin], "admin").unwrap_err();
    assert!(matches!(err, LfError::Forbidden { .. }));

    let cleared = reg.auth.sign_out().unwrap().unwrap();
    assert_eq!(cleared.account_id, "s1");
    assert!(matches!(
        reg.auth.require(&[Role::User], "user").unwrap_err(),
        LfError::NotSignedIn
    ));
}

#[tokio::test]
async fn test_session_row_is_replaced_then_cleared() {
    let (reg, _backend, _dir) = create_test_registry();

    reg.auth.sign_in("ana", "secret1", Role::User).await.unwrap();
    reg.auth.sign_in("budi", "secret2", Role::User).await.unwrap();
    assert_eq!(reg.database.stats().unwrap().sessions, 1);
    assert_eq!(reg.auth.current().unwrap().unwrap().username, "budi");

    assert_eq!(reg.auth.sign_out().unwrap().unwrap().username, "budi");
    assert_eq!(reg.database.stats().unwrap().sessions, 0);
    assert!(reg.auth.sign_out().unwrap().is_none());
}

#[tokio::test]
async fn test_sign_in_rejects_bad_credentials() {
    let (reg, _backend, _dir) = create_test_registry();

    let wrong_password = reg.auth.sign_in("ana", "nope", Role::User).await.unwrap_err();
    assert!(matches!(wrong_password, LfError::InvalidCredentials(_)));

    // Accounts are scoped to their role's table.
    let wrong_role = reg.auth.sign_in("ana", "secret1", Role::Admin).await.unwrap_err();
    assert!(matches!(wrong_role, LfError::InvalidCredentials(_)));

    assert!(reg.auth.current().unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Report submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_submit_uploads_first_image() {
    let (mut reg, backend, _dir) = create_test_registry();

    let outcome = reg
        .reports
        .submit(&form(vec![png("front.png"), png("back.png")]), "u1")
        .await
        .unwrap();
    assert!(outcome.image_uploaded);
    assert_eq!(outcome.report.status, ReportStatus::Reported);
    assert_eq!(outcome.report.date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

    let keys = backend.object_keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("item-images/u1_"));
    assert!(keys[0].ends_with(".png"));
    let url = outcome.report.image_url.unwrap();
    assert!(url.ends_with(keys[0].trim_start_matches("item-images/")));

    let rows = backend.rows(tables::LOST_ITEMS);
    let stored = rows.iter().find(|r| r["name"] == "Grey Backpack").unwrap();
    assert_eq!(stored["date"], "2024-03-10");
    assert_eq!(stored["status"], "reported");

    assert_eq!(reg.dispatch_events(), 1);
    let inbox = reg.notifications.list("u1").unwrap();
    assert_eq!(
        inbox[0].message,
        "Your lost item 'Grey Backpack' has been reported successfully."
    );
}

#[tokio::test]
async fn test_submit_survives_upload_failure() {
    let (reg, backend, _dir) = create_test_registry();
    backend.fail_uploads(true);

    let outcome = reg
        .reports
        .submit(&form(vec![png("front.png")]), "u1")
        .await
        .unwrap();
    assert!(!outcome.image_uploaded);
    assert!(outcome.report.image_url.is_none());
    assert!(backend.object_keys().is_empty());
}

#[tokio::test]
async fn test_submit_reports_all_validation_errors() {
    let (reg, backend, _dir) = create_test_registry();
    let before = backend.rows(tables::LOST_ITEMS).len();

    let bad = ReportForm {
        title: "ab".into(),
        category: String::new(),
        description: "short".into(),
        location: "x".into(),
        date: None,
        ..form(vec![ImageUpload {
            file_name: "notes.txt".into(),
            content_type: "text/plain".into(),
            bytes: vec![1],
        }])
    };
    match reg.reports.submit(&bad, "u1").await.unwrap_err() {
        LfError::Validation(messages) => {
            assert!(messages.contains(&"Title must be at least 3 characters.".to_string()));
            assert!(messages.contains(&"Please select a category.".to_string()));
            assert!(messages.contains(&"Description must be at least 10 characters.".to_string()));
            assert!(messages.contains(&"Location must be at least 3 characters.".to_string()));
            assert!(messages.contains(&"Please select a date.".to_string()));
            assert!(messages.contains(&"notes.txt is not an image file.".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.rows(tables::LOST_ITEMS).len(), before);
}

#[tokio::test]
async fn test_user_reports_and_summary() {
    let (reg, _backend, _dir) = create_test_registry();

    let all = reg.reports.user_reports("u2", None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["f2", "l3", "f1"]);

    let found = reg.reports.user_reports("u2", Some(ReportKind::Found)).await.unwrap();
    assert_eq!(found.len(), 2);

    let summary = reg.reports.user_summary("u2").await.unwrap();
    assert_eq!((summary.total, summary.lost, summary.found), (3, 1, 2));
    assert_eq!(summary.by_status.get(ReportStatus::Matched), 1);

    let report = reg.reports.get(ReportKind::Found, "f1").await.unwrap();
    assert_eq!(report.reporter_display(), "Budi Santoso");
    assert!(matches!(
        reg.reports.get(ReportKind::Lost, "zzz").await.unwrap_err(),
        LfError::NotFound(_)
    ));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_search_merges_both_tables_newest_first() {
    let (reg, _backend, _dir) = create_test_registry();

    let params = SearchParams {
        keyword: Some("LIBRARY".into()),
        ..SearchParams::default()
    };
    let results = reg.search.search(&params).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["f2", "l1"]);

    let lost_only = SearchParams {
        kind: Some(ReportKind::Lost),
        ..params
    };
    let results = reg.search.search(&lost_only).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "l1");
}

#[tokio::test]
async fn test_search_date_range_is_inclusive() {
    let (reg, _backend, _dir) = create_test_registry();
    let params = SearchParams {
        date_from: NaiveDate::from_ymd_opt(2024, 2, 11),
        date_to: NaiveDate::from_ymd_opt(2024, 3, 2),
        ..SearchParams::default()
    };
    let results = reg.search.search(&params).await.unwrap();
    let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["f1", "l2", "l3"]);

    let verified = SearchParams {
        status: Some(ReportStatus::Verified),
        category: Some("electronics".into()),
        ..SearchParams::default()
    };
    let results = reg.search.search(&verified).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "l2");

    let filtered = filter_reports(&results, "ana", None, None);
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_categories_fall_back_to_defaults() {
    let (reg, backend, _dir) = create_test_registry();
    let categories = reg.search.categories().await.unwrap();
    assert_eq!(
        categories,
        vec!["accessories", "documents", "electronics", "keys", "other"]
    );

    backend.fail_table(tables::FOUND_ITEMS);
    let categories = reg.search.categories().await.unwrap();
    assert_eq!(categories.len(), 6);
    assert!(categories.contains(&"clothing".to_string()));
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notifications_are_scoped_per_user() {
    let (reg, _backend, _dir) = create_test_registry();
    let note = |message: &str| NewNotification {
        message: message.into(),
        kind: NotificationKind::Match,
        item_id: None,
    };

    let first = reg.notifications.add("u1", note("first")).unwrap();
    reg.notifications.add("u1", note("second")).unwrap();
    reg.notifications.add("u2", note("other")).unwrap();

    let inbox = reg.notifications.list("u1").unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].message, "second");
    assert_eq!(reg.notifications.unread_count("u1").unwrap(), 2);

    reg.notifications.mark_read("u1", &first.id).unwrap();
    assert_eq!(reg.notifications.unread_count("u1").unwrap(), 1);

    // Another user's notification is invisible.
    assert!(matches!(
        reg.notifications.delete("u2", &first.id).unwrap_err(),
        LfError::NotFound(_)
    ));

    assert_eq!(reg.notifications.mark_all_read("u1").unwrap(), 1);
    reg.notifications.delete("u1", &first.id).unwrap();
    assert_eq!(reg.notifications.clear("u1").unwrap(), 1);
    assert!(reg.notifications.list("u1").unwrap().is_empty());
    assert_eq!(reg.notifications.list("u2").unwrap().len(), 1);
}

#[tokio::test]
async fn test_seeded_backend_shape() {
    let backend = seeded_backend();
    assert_eq!(backend.rows(tables::LOST_ITEMS).len(), 3);
    assert_eq!(backend.rows(tables::FOUND_ITEMS).len(), 2);
}
