//! Lost & Found CLI - command-line front end for the campus lost & found
//! tracker.
//!
//! Exposes the user, security and admin dashboards as subcommands. Each
//! command signs in through the stored session, calls one service, and
//! prints a table or JSON.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use console::style;
use tracing::{debug, error, info};

use lf_core::config::{AppConfig, ConfigHandle};
use lf_core::constants;
use lf_core::error::LfResult;
use lf_core::logging;
use lf_core::platform::Platform;
use lf_models::{ReportKind, ReportStatus, Role};
use lf_services::ServiceRegistry;

/// Campus Lost & Found - report, review and track lost and found items.
#[derive(Parser)]
#[command(
    name = "lostfound",
    version,
    about = "Campus lost & found tracker",
    long_about = "A command-line client for the campus lost & found service.\n\
                  Users report items, security staff verify them, admins manage accounts."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a user, security officer or admin.
    Login {
        /// Account username.
        username: String,
        /// Role to sign in as (user, security, admin).
        #[arg(short, long, default_value = "user")]
        role: Role,
        /// Password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Clear the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Show backend, local database and service status.
    Status,
    /// Report a lost or found item.
    Report {
        /// lost or found.
        kind: ReportKind,
        /// Item name.
        #[arg(short, long)]
        title: String,
        #[arg(short = 'C', long)]
        category: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        location: String,
        /// Day the item was lost or found (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
        /// Image files; only the first is uploaded.
        #[arg(short, long)]
        image: Vec<PathBuf>,
    },
    /// List your own reports.
    Reports {
        /// Only lost or only found reports.
        #[arg(short, long)]
        kind: Option<ReportKind>,
    },
    /// Show one report in detail.
    View {
        kind: ReportKind,
        id: String,
    },
    /// Search reports across both tables.
    Search {
        /// Matches name, description and location.
        keyword: Option<String>,
        #[arg(short = 'C', long)]
        category: Option<String>,
        #[arg(short, long)]
        status: Option<ReportStatus>,
        /// Earliest item date (inclusive).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest item date (inclusive).
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short, long)]
        kind: Option<ReportKind>,
    },
    /// List the categories in use.
    Categories,
    /// Manage your notifications.
    Notifications {
        #[command(subcommand)]
        action: commands::notifications::NotificationsAction,
    },
    /// Security dashboard.
    Security {
        #[command(subcommand)]
        action: commands::security::SecurityAction,
    },
    /// Admin dashboard.
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
    /// Local database management.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

fn load_config(path: Option<&PathBuf>) -> LfResult<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from_file(path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => AppConfig::load_default(),
    }
}

async fn run(cli: Cli) -> LfResult<()> {
    let config = load_config(cli.config.as_ref())?;

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let log_dir = config.effective_log_dir()?;
    let _guard = logging::init_logging(&log_level, &log_dir, config.logging.json_output)?;

    info!(
        "{} CLI v{} on {}",
        constants::APP_NAME,
        constants::APP_VERSION,
        Platform::current()
    );
    let config_handle = ConfigHandle::new(config);
    let format = cli.format;

    match cli.command {
        Commands::Status => return commands::status::run(&config_handle, format).await,
        Commands::Db { action } => return commands::db::run(&config_handle, action, format).await,
        _ => {}
    }

    let mut registry = commands::init_registry(&config_handle).await?;
    let result = dispatch(&registry, cli.command, format).await;

    let stored = registry.dispatch_events();
    debug!("stored {stored} notification(s)");
    registry.shutdown_all()?;
    result
}

async fn dispatch(
    registry: &ServiceRegistry,
    command: Commands,
    format: OutputFormat,
) -> LfResult<()> {
    match command {
        Commands::Login {
            username,
            role,
            password,
        } => commands::auth::login(registry, &username, role, password, format).await,
        Commands::Logout => commands::auth::logout(registry, format),
        Commands::Whoami => commands::auth::whoami(registry, format),
        Commands::Report {
            kind,
            title,
            category,
            description,
            location,
            date,
            image,
        } => {
            let input = commands::reports::ReportInput {
                kind,
                title,
                category,
                description,
                location,
                date,
                images: image,
            };
            commands::reports::submit(registry, input, format).await
        }
        Commands::Reports { kind } => commands::reports::list(registry, kind, format).await,
        Commands::View { kind, id } => commands::reports::view(registry, kind, &id, format).await,
        Commands::Search {
            keyword,
            category,
            status,
            from,
            to,
            kind,
        } => {
            let params = lf_services::SearchParams {
                keyword,
                category,
                status,
                date_from: from,
                date_to: to,
                kind,
            };
            commands::search::search(registry, &params, format).await
        }
        Commands::Categories => commands::search::categories(registry, format).await,
        Commands::Notifications { action } => {
            commands::notifications::run(registry, action, format)
        }
        Commands::Security { action } => commands::security::run(registry, action, format).await,
        Commands::Admin { action } => commands::admin::run(registry, action, format).await,
        Commands::Status | Commands::Db { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("command failed: {e}");
            eprintln!("{} {}", style("error:").red().bold(), e.user_message());
            ExitCode::FAILURE
        }
    }
}
