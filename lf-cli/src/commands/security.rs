//! Security dashboard commands.

use clap::Subcommand;
use console::style;

use lf_core::error::LfResult;
use lf_models::{Actor, ReportKind, ReportStatus, Role};
use lf_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum SecurityAction {
    /// Reports still waiting for verification.
    Pending,
    /// Totals per kind and status.
    Stats,
    /// Move a report to a new status.
    Verify {
        kind: ReportKind,
        id: String,
        /// Target status (verified, matched, returned).
        #[arg(short, long, default_value = "verified")]
        status: ReportStatus,
        /// Notes appended to the activity entry.
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Recent activity across all roles.
    Activity {
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

pub async fn run(
    registry: &ServiceRegistry,
    action: SecurityAction,
    format: OutputFormat,
) -> LfResult<()> {
    let session = registry
        .auth
        .require(&[Role::Security, Role::Admin], "security")?;
    let display = registry.config.read().await.display.clone();

    match action {
        SecurityAction::Pending => {
            let reports = registry.review.pending_reports().await?;
            match format {
                OutputFormat::Json => super::print_json(&reports)?,
                OutputFormat::Text => {
                    println!("{}", style("Pending Verification").bold().underlined());
                    super::print_reports(&reports, "Nothing is waiting for verification.");
                }
            }
        }
        SecurityAction::Stats => {
            let summary = registry.review.security_stats().await?;
            match format {
                OutputFormat::Json => super::print_json(&summary)?,
                OutputFormat::Text => {
                    println!("{}", style("Report Statistics").bold().underlined());
                    println!("  Total:     {}", summary.total);
                    println!("  Lost:      {}", summary.lost);
                    println!("  Found:     {}", summary.found);
                    println!();
                    let mut table = super::new_table(vec!["Status", "Count"]);
                    for status in ReportStatus::ALL {
                        table.add_row(vec![
                            super::status_badge(status).to_string(),
                            summary.by_status.get(status).to_string(),
                        ]);
                    }
                    println!("{table}");
                }
            }
        }
        SecurityAction::Verify {
            kind,
            id,
            status,
            notes,
        } => {
            let actor = Actor::for_role(session.role, session.account_id.clone());
            let outcome = registry
                .review
                .transition(kind, &id, status, notes.as_deref(), &actor)
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&outcome)?,
                OutputFormat::Text => {
                    println!(
                        "{} '{}' moved from {} to {}.",
                        style("OK").green().bold(),
                        outcome.report.name,
                        super::status_badge(outcome.previous),
                        super::status_badge(outcome.report.status)
                    );
                    if !outcome.log_written {
                        println!(
                            "  {} the activity log entry could not be written.",
                            style("WARN").yellow().bold()
                        );
                    }
                }
            }
        }
        SecurityAction::Activity { limit } => {
            let logs = registry
                .review
                .recent_activity(limit.unwrap_or(display.recent_limit))
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&logs)?,
                OutputFormat::Text => {
                    println!("{}", style("Recent Activity").bold().underlined());
                    super::print_logs(&logs, &display.timestamp_format)?;
                }
            }
        }
    }
    Ok(())
}
