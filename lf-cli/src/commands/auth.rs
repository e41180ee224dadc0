//! Session commands: login, logout, whoami.

use console::style;
use dialoguer::Password;

use lf_core::error::LfResult;
use lf_models::Role;
use lf_services::ServiceRegistry;

use crate::OutputFormat;

pub async fn login(
    registry: &ServiceRegistry,
    username: &str,
    role: Role,
    password: Option<String>,
    format: OutputFormat,
) -> LfResult<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("{} password", role.label()))
            .interact()
            .map_err(super::prompt_err)?,
    };

    let session = registry.auth.sign_in(username, &password, role).await?;

    match format {
        OutputFormat::Json => super::print_json(&session)?,
        OutputFormat::Text => {
            println!(
                "{} Signed in as {} ({})",
                style("OK").green().bold(),
                style(&session.name).bold(),
                session.role.label()
            );
        }
    }
    Ok(())
}

pub fn logout(registry: &ServiceRegistry, format: OutputFormat) -> LfResult<()> {
    let previous = registry.auth.sign_out()?;

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "signed_out": previous.is_some(),
            "account_id": previous.as_ref().map(|s| s.account_id.clone()),
        }))?,
        OutputFormat::Text => match previous {
            Some(session) => println!("Signed out {}.", session.username),
            None => println!("{}", style("No active session.").dim()),
        },
    }
    Ok(())
}

pub fn whoami(registry: &ServiceRegistry, format: OutputFormat) -> LfResult<()> {
    let session = registry.auth.current()?;

    match format {
        OutputFormat::Json => super::print_json(&session)?,
        OutputFormat::Text => match session {
            Some(s) => {
                println!("{}", style("Current Session").bold().underlined());
                println!("  Name:      {}", s.name);
                println!("  Username:  {}", s.username);
                println!("  Role:      {}", s.role.label());
                println!("  Since:     {}", s.signed_in_at.format("%Y-%m-%d %H:%M"));
            }
            None => println!("{}", style("Not signed in.").dim()),
        },
    }
    Ok(())
}
