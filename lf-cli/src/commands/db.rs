//! Local database management commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use lf_core::config::ConfigHandle;
use lf_core::error::LfResult;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show database statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the database (drops the session and all notifications).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

pub async fn run(config: &ConfigHandle, action: DbAction, format: OutputFormat) -> LfResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let db = super::init_database(config).await?;
            let stats = db.stats()?;
            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());
            let schema_version = lf_models::migrations::get_schema_version(&conn)?;

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "path": db_path.display().to_string(),
                    "tables": {
                        "session": stats.sessions,
                        "notifications": stats.notifications,
                    },
                    "unread_notifications": stats.unread_notifications,
                    "file_size_bytes": file_size,
                    "journal_mode": journal_mode,
                    "schema_version": schema_version,
                }))?,
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:            {}", db_path.display());
                    println!("  Journal mode:    {journal_mode}");
                    println!("  Schema version:  {schema_version}");
                    if let Some(size) = file_size {
                        println!("  Size:            {size} bytes");
                    }
                    println!();

                    let mut table = super::new_table(vec!["Table", "Row Count"]);
                    table.add_row(vec!["session".to_string(), stats.sessions.to_string()]);
                    table.add_row(vec![
                        "notifications".to_string(),
                        stats.notifications.to_string(),
                    ]);
                    println!("{table}");
                    println!("  {} unread notification(s)", stats.unread_notifications);
                }
            }
        }
        DbAction::Check => {
            let db = super::init_database(config).await?;
            let result = db.run_integrity_check();
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "ok": result.is_ok(),
                    "error": result.as_ref().err().map(|e| e.to_string()),
                }))?,
                OutputFormat::Text => match &result {
                    Ok(()) => println!(
                        "  {} Integrity check passed.",
                        style("OK").green().bold()
                    ),
                    Err(e) => println!(
                        "  {} Integrity check failed: {e}",
                        style("FAIL").red().bold()
                    ),
                },
            }
            result?;
        }
        DbAction::Reset { yes } => {
            if !yes {
                println!(
                    "  {} This will sign you out and delete all notifications.",
                    style("WARNING").red().bold()
                );
                println!("  Database: {}", db_path.display());
                let confirmed = Confirm::new()
                    .with_prompt("  Are you sure you want to reset the database?")
                    .default(false)
                    .interact()
                    .map_err(super::prompt_err)?;
                if !confirmed {
                    println!("  Reset cancelled.");
                    return Ok(());
                }
            }

            let db = super::init_database(config).await?;
            db.reset()?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "reset": true }))?,
                OutputFormat::Text => println!(
                    "  {} Database reset complete.",
                    style("OK").green().bold()
                ),
            }
        }
        DbAction::Path => match format {
            OutputFormat::Json => super::print_json(&serde_json::json!({
                "path": db_path.display().to_string(),
            }))?,
            OutputFormat::Text => println!("{}", db_path.display()),
        },
    }
    Ok(())
}
