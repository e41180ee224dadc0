//! CLI command implementations.

pub mod admin;
pub mod auth;
pub mod db;
pub mod notifications;
pub mod reports;
pub mod search;
pub mod security;
pub mod status;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::{style, StyledObject};
use serde::Serialize;

use lf_api::{ApiClient, Backend};
use lf_core::config::ConfigHandle;
use lf_core::error::{LfError, LfResult};
use lf_models::{ActivityLog, Database, Report, ReportStatus};
use lf_services::ServiceRegistry;

/// Helper to initialize the local database from config.
pub async fn init_database(config: &ConfigHandle) -> LfResult<Database> {
    let cfg = config.read().await;
    let db_path = cfg.effective_db_path()?;
    let db = Database::init(&db_path, &cfg.database)?;
    if cfg.database.integrity_check_on_startup {
        db.run_integrity_check()?;
    }
    Ok(db)
}

/// Helper to create the backend client from config.
pub async fn create_backend(config: &ConfigHandle) -> LfResult<Arc<dyn Backend>> {
    let backend_config = config.read().await.backend.clone();
    Ok(Arc::new(ApiClient::new(&backend_config)?))
}

/// Build and initialize every service.
pub async fn init_registry(config: &ConfigHandle) -> LfResult<ServiceRegistry> {
    let database = init_database(config).await?;
    let backend = create_backend(config).await?;
    let mut registry = ServiceRegistry::new(config.snapshot().await, database, backend);
    registry.init_all()?;
    Ok(registry)
}

/// Pretty-print any serializable value as JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> LfResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Table with the workspace's standard look.
pub fn new_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<comfy_table::Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Colored status badge.
pub fn status_badge(status: ReportStatus) -> StyledObject<&'static str> {
    let label = style(status.label());
    match status {
        ReportStatus::Reported => label.yellow(),
        ReportStatus::Verified => label.cyan(),
        ReportStatus::Matched => label.magenta(),
        ReportStatus::Returned => label.green(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>, format: &str) -> LfResult<String> {
    lf_services::export::format_timestamp(ts, format)
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Render reports as a table.
pub fn print_reports(reports: &[Report], empty: &str) {
    if reports.is_empty() {
        println!("{empty}");
        return;
    }
    let mut table = new_table(vec![
        "ID", "Kind", "Item", "Category", "Location", "Date", "Status", "Reporter",
    ]);
    for r in reports {
        table.add_row(vec![
            truncate(&r.id, 12),
            r.kind.label().to_string(),
            truncate(&r.name, 28),
            r.category.clone(),
            truncate(&r.location, 20),
            r.date.format("%Y-%m-%d").to_string(),
            status_badge(r.status).to_string(),
            r.reporter_display().to_string(),
        ]);
    }
    println!("{table}");
    println!("\n{} report(s)", reports.len());
}

/// Render activity-log entries as a table.
pub fn print_logs(logs: &[ActivityLog], timestamp_format: &str) -> LfResult<()> {
    if logs.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }
    let mut table = new_table(vec!["Time", "Performed By", "Action"]);
    for log in logs {
        table.add_row(vec![
            format_timestamp(&log.timestamp, timestamp_format)?,
            log.performer().to_string(),
            log.action.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Map a dialoguer prompt failure into the workspace error.
pub fn prompt_err(e: dialoguer::Error) -> LfError {
    LfError::Internal(format!("prompt failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Perpustakaan Pusat", 10), "Perpust...");
        assert_eq!(truncate("ééééé", 4), "é...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
