//! Integration tests for the local database: session and notification
//! persistence, statistics and reset.

mod common;

use common::create_test_db;
use lf_models::{Database, NewNotification, Notification, NotificationKind, Role, Session};

fn session(id: &str) -> Session {
    Session {
        account_id: id.into(),
        username: "ana".into(),
        name: "Ana Putri".into(),
        role: Role::User,
        signed_in_at: chrono::Utc::now(),
    }
}

fn notify(db: &Database, user: &str, message: &str) -> Notification {
    let conn = db.conn().unwrap();
    Notification::insert(
        &conn,
        user,
        NewNotification {
            message: message.into(),
            kind: NotificationKind::Verification,
            item_id: Some("l1".into()),
        },
    )
    .unwrap()
}

#[test]
fn test_fresh_database_is_empty_and_healthy() {
    let (db, _dir) = create_test_db();
    db.run_integrity_check().unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.sessions, 0);
    assert_eq!(stats.notifications, 0);
}

#[test]
fn test_session_survives_reopen() {
    let (db, dir) = create_test_db();
    session("u1").save(&db.conn().unwrap()).unwrap();
    drop(db);

    let reopened = Database::init(&dir.path().join("test.db"), &Default::default()).unwrap();
    let loaded = Session::load(&reopened.conn().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.account_id, "u1");
    assert_eq!(loaded.role, Role::User);
}

#[test]
fn test_notifications_newest_first_and_counted() {
    let (db, _dir) = create_test_db();
    notify(&db, "u1", "first");
    notify(&db, "u1", "second");
    notify(&db, "u2", "elsewhere");

    let conn = db.conn().unwrap();
    let list = Notification::list_for_user(&conn, "u1").unwrap();
    let messages: Vec<&str> = list.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, vec!["second", "first"]);
    assert!(list.iter().all(|n| !n.is_read));

    let stats = db.stats().unwrap();
    assert_eq!(stats.notifications, 3);
    assert_eq!(stats.unread_notifications, 3);
}

#[test]
fn test_reset_drops_everything() {
    let (db, _dir) = create_test_db();
    session("u1").save(&db.conn().unwrap()).unwrap();
    notify(&db, "u1", "hello");

    db.reset().unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.sessions, 0);
    assert_eq!(stats.notifications, 0);
    assert_eq!(
        lf_models::migrations::get_schema_version(&db.conn().unwrap()).unwrap(),
        lf_core::constants::DB_SCHEMA_VERSION
    );
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let (db, _dir) = create_test_db();
    let result: lf_core::error::LfResult<()> = db.transaction(|tx| {
        session("u1").save(tx)?;
        Err(lf_core::error::LfError::Internal("abort".into()))
    });
    assert!(result.is_err());
    assert!(Session::load(&db.conn().unwrap()).unwrap().is_none());
}
