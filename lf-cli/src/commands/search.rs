//! Search commands.

use console::style;

use lf_core::error::LfResult;
use lf_models::Role;
use lf_services::{SearchParams, ServiceRegistry};

use crate::OutputFormat;

pub async fn search(
    registry: &ServiceRegistry,
    params: &SearchParams,
    format: OutputFormat,
) -> LfResult<()> {
    registry.auth.require(&Role::ALL, "search")?;
    let reports = registry.search.search(params).await?;

    match format {
        OutputFormat::Json => super::print_json(&reports)?,
        OutputFormat::Text => {
            if let Some(keyword) = params.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
                println!("Results for {}", style(keyword).bold());
                println!();
            }
            super::print_reports(&reports, "No items match your search.");
        }
    }
    Ok(())
}

pub async fn categories(registry: &ServiceRegistry, format: OutputFormat) -> LfResult<()> {
    let categories = registry.search.categories().await?;

    match format {
        OutputFormat::Json => super::print_json(&categories)?,
        OutputFormat::Text => {
            println!("{}", style("Categories").bold().underlined());
            for category in &categories {
                println!("  {category}");
            }
        }
    }
    Ok(())
}
