//! Lost & Found Services - business rules and service layer.
//!
//! This crate provides the service trait, the service registry, and the
//! concrete services behind the three dashboards:
//! - Auth (role-scoped sign-in, local session, route checks)
//! - Reports (submission with image upload, per-user listings)
//! - Review (status lifecycle, pending queue, security dashboard)
//! - Search (pushed-down filters over both report tables, categories)
//! - Admin (statistics, account management, monthly buckets)
//! - Activity log (performer resolution, CSV export)
//! - Notifications (local per-user list fed by report events)
//! - Event bus (typed intra-service communication)

pub mod activity;
pub mod admin;
pub mod auth;
pub mod event_bus;
pub mod export;
pub mod notifications;
pub mod registry;
pub mod reports;
pub mod review;
pub mod search;
pub mod service;
pub mod stats;

// Re-export key types
pub use activity::ActivityService;
pub use admin::{AccountChange, AdminService, AdminStats};
pub use auth::AuthService;
pub use event_bus::{AppEvent, EventBus};
pub use notifications::NotificationService;
pub use registry::ServiceRegistry;
pub use reports::{ReportService, SubmitOutcome};
pub use review::{ReviewService, TransitionOutcome};
pub use search::{SearchParams, SearchService};
pub use service::{Service, ServiceState};
pub use stats::{MonthlyBucket, ReportSummary, StatusCounts};
