//! Notification commands for the signed-in user.

use clap::Subcommand;
use console::style;

use lf_core::error::LfResult;
use lf_models::Role;
use lf_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum NotificationsAction {
    /// List notifications, newest first.
    List {
        /// Only unread notifications.
        #[arg(short, long)]
        unread: bool,
    },
    /// Mark one notification as read.
    Read { id: String },
    /// Mark every notification as read.
    ReadAll,
    /// Delete one notification.
    Delete { id: String },
    /// Delete every notification.
    Clear,
}

pub fn run(
    registry: &ServiceRegistry,
    action: NotificationsAction,
    format: OutputFormat,
) -> LfResult<()> {
    let session = registry.auth.require(&[Role::User], "user")?;
    let user_id = session.account_id.as_str();
    let service = &registry.notifications;

    match action {
        NotificationsAction::List { unread } => {
            let mut list = service.list(user_id)?;
            if unread {
                list.retain(|n| !n.is_read);
            }
            match format {
                OutputFormat::Json => super::print_json(&list)?,
                OutputFormat::Text => {
                    if list.is_empty() {
                        println!("{}", style("No notifications.").dim());
                        return Ok(());
                    }
                    let mut table = super::new_table(vec!["ID", "", "Message", "Received"]);
                    for n in &list {
                        let marker = if n.is_read {
                            style("").dim()
                        } else {
                            style("*").cyan().bold()
                        };
                        table.add_row(vec![
                            super::truncate(&n.id, 12),
                            marker.to_string(),
                            n.message.clone(),
                            n.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        ]);
                    }
                    println!("{table}");
                    println!("\n{} unread", service.unread_count(user_id)?);
                }
            }
        }
        NotificationsAction::Read { id } => {
            service.mark_read(user_id, &id)?;
            done(format, "read", 1)?;
        }
        NotificationsAction::ReadAll => {
            let count = service.mark_all_read(user_id)?;
            done(format, "read", count)?;
        }
        NotificationsAction::Delete { id } => {
            service.delete(user_id, &id)?;
            done(format, "deleted", 1)?;
        }
        NotificationsAction::Clear => {
            let count = service.clear(user_id)?;
            done(format, "deleted", count)?;
        }
    }
    Ok(())
}

fn done(format: OutputFormat, verb: &str, count: usize) -> LfResult<()> {
    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({ "action": verb, "count": count }))
        }
        OutputFormat::Text => {
            println!("{} {count} notification(s) {verb}.", style("OK").green().bold());
            Ok(())
        }
    }
}
