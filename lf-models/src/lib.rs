//! Lost & Found Models - domain types, form validation and local persistence.
//!
//! Remote rows (reports, accounts, activity logs) are decoded from the
//! hosted backend's JSON. Sessions and notifications live in a local SQLite
//! database with versioned migrations.

pub mod db;
pub mod migrations;
pub mod models;
pub mod schema;

// Re-export key types
pub use db::{Database, DbPool};
pub use models::account::{Account, Role};
pub use models::activity::{ActivityLog, Actor, ActorDirectory};
pub use models::forms::{AccountForm, AccountUpdate, ImageUpload, ReportForm};
pub use models::notification::{NewNotification, Notification, NotificationKind};
pub use models::report::{NewReport, Report, ReportKind};
pub use models::session::Session;
pub use models::status::ReportStatus;
