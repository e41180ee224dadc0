//! Admin dashboard commands: statistics, accounts, reports and logs.

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use console::style;
use dialoguer::{Confirm, Password};

use lf_core::error::{LfError, LfResult};
use lf_models::{Account, AccountForm, AccountUpdate, ReportKind, ReportStatus, Role};
use lf_services::search::filter_reports;
use lf_services::{export, AccountChange, ActivityService, ServiceRegistry};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Totals plus the newest accounts and reports.
    Stats,
    /// Lost, found and returned counts for the last six months.
    Monthly,
    /// Account management.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Report management.
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },
    /// Activity log.
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List accounts.
    List {
        #[arg(short, long)]
        role: Option<Role>,
        /// Matches name, username or NIM/NIP.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a user or security account.
    Create {
        /// user or security.
        #[arg(short, long, default_value = "user")]
        role: Role,
        #[arg(short, long)]
        name: String,
        /// NIM/NIP for users, badge number for security staff.
        #[arg(short, long)]
        identifier: String,
        #[arg(short, long)]
        username: String,
    },
    /// Edit an account. Omitted fields keep their current value.
    Update {
        role: Role,
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        identifier: Option<String>,
        /// Prompt for a new password.
        #[arg(long)]
        password: bool,
    },
    /// Delete an account.
    Delete {
        role: Role,
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportsAction {
    /// List every report, optionally filtered.
    List {
        /// Matches name, description, location, category or reporter.
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        kind: Option<ReportKind>,
        #[arg(long)]
        status: Option<ReportStatus>,
    },
    /// Mark a report as returned to its owner.
    Return { kind: ReportKind, id: String },
}

#[derive(Subcommand)]
pub enum LogsAction {
    /// Show the activity log.
    List {
        /// Matches the action text or performer.
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Export the activity log as CSV.
    Export {
        /// Output file (defaults to activity_logs_<date>.csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only export entries matching this text.
        #[arg(short, long)]
        search: Option<String>,
    },
}

pub async fn run(
    registry: &ServiceRegistry,
    action: AdminAction,
    format: OutputFormat,
) -> LfResult<()> {
    let session = registry.auth.require(&[Role::Admin], "admin")?;
    let admin_id = session.account_id.as_str();
    let display = registry.config.read().await.display.clone();

    match action {
        AdminAction::Stats => {
            let stats = registry.admin.stats().await?;
            let users = registry.admin.recent_users(display.recent_limit).await?;
            let reports = registry.admin.recent_reports(display.recent_limit).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "stats": stats,
                    "recent_users": users,
                    "recent_reports": reports,
                }))?,
                OutputFormat::Text => {
                    println!("{}", style("Overview").bold().underlined());
                    println!(
                        "  Accounts:  {} ({} users, {} security, {} admins)",
                        stats.total_users, stats.regular, stats.security, stats.admin
                    );
                    println!(
                        "  Reports:   {} ({} lost, {} found)",
                        stats.total_reports, stats.lost, stats.found
                    );
                    println!(
                        "  Status:    {} reported, {} verified, {} matched, {} returned",
                        stats.by_status.reported,
                        stats.by_status.verified,
                        stats.by_status.matched,
                        stats.by_status.returned
                    );
                    println!();
                    println!("{}", style("Newest Accounts").bold().underlined());
                    print_accounts(&users);
                    println!();
                    println!("{}", style("Newest Reports").bold().underlined());
                    super::print_reports(&reports, "No reports yet.");
                }
            }
        }
        AdminAction::Monthly => {
            let buckets = registry
                .admin
                .monthly_stats(Local::now().date_naive())
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&buckets)?,
                OutputFormat::Text => {
                    let mut table = super::new_table(vec!["Month", "Lost", "Found", "Returned"]);
                    for b in &buckets {
                        table.add_row(vec![
                            format!("{} {}", b.name, b.month.format("%Y")),
                            b.lost.to_string(),
                            b.found.to_string(),
                            b.returned.to_string(),
                        ]);
                    }
                    println!("{table}");
                }
            }
        }
        AdminAction::Users { action } => users(registry, action, admin_id, format).await?,
        AdminAction::Reports { action } => match action {
            ReportsAction::List {
                search,
                kind,
                status,
            } => {
                let all = registry.admin.all_reports().await?;
                let search = search.as_deref().unwrap_or_default();
                let reports = filter_reports(&all, search, kind, status);
                match format {
                    OutputFormat::Json => super::print_json(&reports)?,
                    OutputFormat::Text => super::print_reports(&reports, "No reports match."),
                }
            }
            ReportsAction::Return { kind, id } => {
                let outcome = registry.review.mark_returned(kind, &id, admin_id).await?;
                match format {
                    OutputFormat::Json => super::print_json(&outcome)?,
                    OutputFormat::Text => println!(
                        "{} '{}' marked as returned.",
                        style("OK").green().bold(),
                        outcome.report.name
                    ),
                }
            }
        },
        AdminAction::Logs { action } => match action {
            LogsAction::List { search, limit } => {
                let logs = match limit {
                    Some(limit) => registry.activity.recent(limit).await?,
                    None => registry.activity.all().await?,
                };
                let search = search.as_deref().unwrap_or_default();
                let logs = ActivityService::filter_logs(&logs, search);
                match format {
                    OutputFormat::Json => super::print_json(&logs)?,
                    OutputFormat::Text => super::print_logs(&logs, &display.timestamp_format)?,
                }
            }
            LogsAction::Export { output, search } => {
                let logs = registry.activity.all().await?;
                let search = search.as_deref().unwrap_or_default();
                let logs = ActivityService::filter_logs(&logs, search);
                let path = output.unwrap_or_else(|| {
                    PathBuf::from(export::default_file_name(Local::now().date_naive()))
                });
                export::write_csv(&path, &logs, &display.timestamp_format)?;
                match format {
                    OutputFormat::Json => super::print_json(&serde_json::json!({
                        "path": path.display().to_string(),
                        "rows": logs.len(),
                    }))?,
                    OutputFormat::Text => println!(
                        "{} Exported {} entries to {}",
                        style("OK").green().bold(),
                        logs.len(),
                        path.display()
                    ),
                }
            }
        },
    }
    Ok(())
}

async fn users(
    registry: &ServiceRegistry,
    action: UsersAction,
    admin_id: &str,
    format: OutputFormat,
) -> LfResult<()> {
    match action {
        UsersAction::List { role, search } => {
            let accounts = registry
                .admin
                .list_accounts(role, search.as_deref())
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&accounts)?,
                OutputFormat::Text => print_accounts(&accounts),
            }
        }
        UsersAction::Create {
            role,
            name,
            identifier,
            username,
        } => {
            let password = prompt_password("Password")?;
            let confirm_password = prompt_password("Confirm password")?;
            let form = AccountForm {
                role,
                name,
                identifier,
                username,
                password,
                confirm_password,
            };
            let change = registry.admin.create_account(&form, admin_id).await?;
            print_change(&change, "created", format)?;
        }
        UsersAction::Update {
            role,
            id,
            name,
            username,
            identifier,
            password,
        } => {
            let current = registry
                .admin
                .list_accounts(Some(role), None)
                .await?
                .into_iter()
                .find(|a| a.id == id)
                .ok_or_else(|| LfError::NotFound(format!("{role} account {id}")))?;
            let password = if password {
                Some(prompt_password("New password")?)
            } else {
                None
            };
            let update = AccountUpdate {
                name: name.unwrap_or(current.name),
                username: username.unwrap_or(current.username),
                identifier: identifier.or(current.identifier),
                password,
            };
            let change = registry
                .admin
                .update_account(role, &id, &update, admin_id)
                .await?;
            print_change(&change, "updated", format)?;
        }
        UsersAction::Delete { role, id, yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {role} account {id}?"))
                    .default(false)
                    .interact()
                    .map_err(super::prompt_err)?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let change = registry.admin.delete_account(role, &id, admin_id).await?;
            print_change(&change, "deleted", format)?;
        }
    }
    Ok(())
}

fn prompt_password(prompt: &str) -> LfResult<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(super::prompt_err)
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }
    let mut table = super::new_table(vec!["ID", "Role", "Name", "Username", "NIM/NIP", "Created"]);
    for a in accounts {
        table.add_row(vec![
            super::truncate(&a.id, 12),
            a.role.label().to_string(),
            a.name.clone(),
            a.username.clone(),
            a.identifier.clone().unwrap_or_default(),
            a.created_at
                .map(|ts| ts.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{table}");
}

fn print_change(change: &AccountChange, verb: &str, format: OutputFormat) -> LfResult<()> {
    match format {
        OutputFormat::Json => super::print_json(change),
        OutputFormat::Text => {
            println!(
                "{} {} account {} ({}) {verb}.",
                style("OK").green().bold(),
                change.role.label(),
                change.name,
                change.username
            );
            if !change.log_written {
                println!(
                    "  {} the activity log entry could not be written.",
                    style("WARN").yellow().bold()
                );
            }
            Ok(())
        }
    }
}
