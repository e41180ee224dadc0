//! Status command - show backend, local database and service status.

use console::style;

use lf_api::Query;
use lf_core::config::ConfigHandle;
use lf_core::error::LfResult;
use lf_models::{ReportKind, Session};
use lf_services::ServiceRegistry;

use crate::OutputFormat;

/// Run the status command.
pub async fn run(config: &ConfigHandle, format: OutputFormat) -> LfResult<()> {
    let cfg = config.snapshot().await;
    let db_path = cfg.effective_db_path()?;

    let (reachable, latency_ms) = if cfg.is_backend_configured() {
        let backend = super::create_backend(config).await?;
        let start = std::time::Instant::now();
        let reachable = backend.count(&Query::table(ReportKind::Lost.table())).await.is_ok();
        (reachable, Some(start.elapsed().as_millis()))
    } else {
        (false, None)
    };

    let db = super::init_database(config).await.ok();
    let db_stats = db.as_ref().and_then(|d| d.stats().ok());
    let session = db
        .as_ref()
        .and_then(|d| d.conn().ok())
        .and_then(|conn| Session::load(&conn).ok().flatten());

    // Service health needs a backend client, which needs a configured URL.
    let health = match db {
        Some(database) if cfg.is_backend_configured() => {
            let backend = super::create_backend(config).await?;
            let mut registry = ServiceRegistry::new(cfg.clone(), database, backend);
            registry.init_all()?;
            let health = registry.health_check();
            registry.shutdown_all()?;
            health
        }
        _ => Vec::new(),
    };

    match format {
        OutputFormat::Json => {
            let services: Vec<_> = health
                .iter()
                .map(|(name, state, healthy)| {
                    serde_json::json!({
                        "name": name,
                        "state": state.to_string(),
                        "healthy": healthy,
                    })
                })
                .collect();
            super::print_json(&serde_json::json!({
                "backend_url": cfg.backend.url,
                "backend_configured": cfg.is_backend_configured(),
                "backend_reachable": reachable,
                "latency_ms": latency_ms,
                "session": session,
                "local_database": db_stats.as_ref().map(|s| serde_json::json!({
                    "path": db_path.display().to_string(),
                    "sessions": s.sessions,
                    "notifications": s.notifications,
                    "unread_notifications": s.unread_notifications,
                })),
                "services": services,
            }))?;
        }
        OutputFormat::Text => {
            println!("{}", style("Backend").bold().underlined());
            if cfg.is_backend_configured() {
                println!("  URL:       {}", cfg.backend.url);
                println!(
                    "  Status:    {}",
                    match (reachable, latency_ms) {
                        (true, Some(ms)) => format!("{} ({ms}ms)", style("reachable").green()),
                        _ => style("unreachable").red().to_string(),
                    }
                );
            } else {
                println!(
                    "  {} set backend.url and backend.anon_key in the config file",
                    style("not configured").yellow()
                );
            }

            println!();
            println!("{}", style("Session").bold().underlined());
            match &session {
                Some(s) => println!("  {} ({}, {})", s.name, s.username, s.role.label()),
                None => println!("  {}", style("not signed in").dim()),
            }

            println!();
            println!("{}", style("Local Database").bold().underlined());
            println!("  Path:           {}", db_path.display());
            match &db_stats {
                Some(stats) => {
                    println!("  Notifications:  {}", stats.notifications);
                    println!("  Unread:         {}", stats.unread_notifications);
                }
                None => println!("  {}", style("unavailable").red()),
            }

            if !health.is_empty() {
                println!();
                println!("{}", style("Services").bold().underlined());
                for (name, state, healthy) in &health {
                    let mark = if *healthy {
                        style("OK").green().bold()
                    } else {
                        style("FAIL").red().bold()
                    };
                    println!("  {mark} {name} ({state})");
                }
            }
        }
    }
    Ok(())
}
