//! User dashboard commands: submit, list and view reports.

use std::path::PathBuf;

use chrono::NaiveDate;
use console::style;

use lf_core::error::LfResult;
use lf_models::{ImageUpload, ReportForm, ReportKind, Role};
use lf_services::ServiceRegistry;

use crate::OutputFormat;

/// Raw report fields as given on the command line.
pub struct ReportInput {
    pub kind: ReportKind,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub images: Vec<PathBuf>,
}

pub async fn submit(
    registry: &ServiceRegistry,
    input: ReportInput,
    format: OutputFormat,
) -> LfResult<()> {
    let session = registry.auth.require(&[Role::User], "user")?;

    let images = input
        .images
        .iter()
        .map(|path| ImageUpload::from_path(path))
        .collect::<LfResult<Vec<_>>>()?;
    let form = ReportForm {
        kind: input.kind,
        title: input.title,
        category: input.category,
        description: input.description,
        location: input.location,
        date: Some(input.date),
        images,
    };

    let outcome = registry.reports.submit(&form, &session.account_id).await?;

    match format {
        OutputFormat::Json => super::print_json(&outcome)?,
        OutputFormat::Text => {
            println!(
                "{} {} item '{}' reported (id {}).",
                style("OK").green().bold(),
                outcome.report.kind.label(),
                outcome.report.name,
                outcome.report.id
            );
            if !form.images.is_empty() && !outcome.image_uploaded {
                println!(
                    "  {} the image could not be uploaded; the report was saved without it.",
                    style("WARN").yellow().bold()
                );
            }
        }
    }
    Ok(())
}

pub async fn list(
    registry: &ServiceRegistry,
    kind: Option<ReportKind>,
    format: OutputFormat,
) -> LfResult<()> {
    let session = registry.auth.require(&[Role::User], "user")?;
    let reports = registry.reports.user_reports(&session.account_id, kind).await?;

    match format {
        OutputFormat::Json => super::print_json(&reports)?,
        OutputFormat::Text => {
            let summary = registry.reports.user_summary(&session.account_id).await?;
            println!("{}", style("My Reports").bold().underlined());
            println!(
                "  Lost: {}  Found: {}  Returned: {}",
                summary.lost, summary.found, summary.by_status.returned
            );
            println!();
            super::print_reports(&reports, "You have not reported any items yet.");
        }
    }
    Ok(())
}

pub async fn view(
    registry: &ServiceRegistry,
    kind: ReportKind,
    id: &str,
    format: OutputFormat,
) -> LfResult<()> {
    registry.auth.require(&[Role::User, Role::Security, Role::Admin], "report")?;
    let report = registry.reports.get(kind, id).await?;

    match format {
        OutputFormat::Json => super::print_json(&report)?,
        OutputFormat::Text => {
            let ts_format = registry.config.read().await.display.timestamp_format.clone();
            println!("{}", style(&report.name).bold().underlined());
            println!("  Kind:         {}", report.kind.label());
            println!("  Status:       {}", super::status_badge(report.status));
            println!("  Category:     {}", report.category);
            println!("  Location:     {}", report.location);
            println!("  Date:         {}", report.date.format("%Y-%m-%d"));
            println!("  Reported by:  {}", report.reporter_display());
            println!(
                "  Submitted:    {}",
                super::format_timestamp(&report.created_at, &ts_format)?
            );
            if let Some(url) = &report.image_url {
                println!("  Image:        {url}");
            }
            println!();
            println!("{}", report.description);
        }
    }
    Ok(())
}
