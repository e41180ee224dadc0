//! CSV export of the activity log.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use lf_core::error::{LfError, LfResult};
use lf_models::ActivityLog;

const HEADER: [&str; 4] = ["ID", "Action", "Performed By", "Timestamp"];

/// Wrap a cell in double quotes, doubling embedded quotes.
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells.into_iter().map(quote).collect::<Vec<_>>().join(",")
}

/// Format `ts` with a user-supplied strftime string. Unknown specifiers
/// are a config error rather than a panic.
pub fn format_timestamp(ts: &DateTime<Utc>, format: &str) -> LfResult<String> {
    let mut out = String::new();
    write!(out, "{}", ts.format(format))
        .map_err(|_| LfError::Config(format!("invalid timestamp format {format:?}")))?;
    Ok(out)
}

/// Render logs as CSV: a header line plus one line per log, joined by `\n`.
pub fn logs_to_csv(logs: &[ActivityLog], timestamp_format: &str) -> LfResult<String> {
    let mut lines = Vec::with_capacity(logs.len() + 1);
    lines.push(row(HEADER));
    for log in logs {
        let timestamp = format_timestamp(&log.timestamp, timestamp_format)?;
        lines.push(row([
            log.id.as_str(),
            log.action.as_str(),
            log.performer(),
            timestamp.as_str(),
        ]));
    }
    Ok(lines.join("\n"))
}

/// `activity_logs_YYYY-MM-DD.csv`
pub fn default_file_name(today: NaiveDate) -> String {
    format!("activity_logs_{}.csv", today.format("%Y-%m-%d"))
}

/// Write the CSV for `logs` to `path`. Refuses an empty log.
pub fn write_csv(path: &Path, logs: &[ActivityLog], timestamp_format: &str) -> LfResult<()> {
    if logs.is_empty() {
        return Err(LfError::Validation(vec![
            "No activity logs to export.".to_string(),
        ]));
    }
    std::fs::write(path, logs_to_csv(logs, timestamp_format)?)?;
    info!("exported {} activity logs to {}", logs.len(), path.display());
    Ok(())
}
