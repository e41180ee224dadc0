//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Campus Lost & Found";

/// Directory name used under the platform data and config directories.
pub const APP_DIR_NAME: &str = "LostAndFound";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backend API timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Local database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Storage bucket for item images.
pub const IMAGE_BUCKET: &str = "item-images";

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Images a user may attach to one report. Only the first is uploaded.
pub const MAX_IMAGES_PER_REPORT: usize = 3;

/// Rows shown in "recent" dashboard panels.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Months covered by the admin monthly statistics.
pub const MONTHLY_STATS_MONTHS: u32 = 6;

/// Actor name used when an activity has no resolvable performer.
pub const SYSTEM_ACTOR: &str = "System";

/// Remote table names.
pub mod tables {
    pub const USERS: &str = "users";
    pub const SECURITY_STAFF: &str = "security_staff";
    pub const ADMINS: &str = "admins";
    pub const LOST_ITEMS: &str = "lost_items";
    pub const FOUND_ITEMS: &str = "found_items";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

/// Remote procedures.
pub mod rpc {
    /// Creates a security staff row with a generated badge number.
    pub const CREATE_SECURITY_ACCOUNT: &str = "create_security_account";
}

/// Categories offered when none can be derived from existing reports.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "electronics",
    "clothing",
    "accessories",
    "documents",
    "keys",
    "other",
];
