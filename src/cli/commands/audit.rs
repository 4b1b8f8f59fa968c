//! Implementation of the `signal-lab audit` command.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use comfy_table::{Cell, Color};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::context::AppContext;
use crate::cli::output::{
    dollars, heading, list_table, output, severity_cell, styled_health, truncate, CommandOutput,
};
use crate::domain::models::{AuditResult, ClientRevenueData, EcommerceSignal};
use crate::domain::ports::ReportSink;

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Store URL to audit (absolute http/https)
    pub url: String,

    /// Monthly revenue in dollars, used for leakage estimates
    #[arg(long)]
    pub revenue: Option<f64>,

    /// Monthly ad spend in dollars
    #[arg(long)]
    pub ad_spend: Option<f64>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutput {
    pub audit: AuditResult,
    pub report_location: Option<String>,
    #[serde(skip)]
    pub minimum_passing_health: u32,
}

impl CommandOutput for AuditOutput {
    fn to_human(&self) -> String {
        let audit = &self.audit;
        let mut lines = vec![
            heading(&format!("Signal audit: {}", audit.target_url)),
            format!(
                "Signal health: {}",
                styled_health(audit.signal_health, self.minimum_passing_health)
            ),
            format!(
                "Leakage: {}/month ({}/year), signal loss {:.0}%",
                dollars(audit.revenue_leakage.monthly_loss),
                dollars(audit.revenue_leakage.annual_loss),
                audit.revenue_leakage.signal_loss_percentage
            ),
        ];
        if let Some(note) = &audit.revenue_leakage.note {
            lines.push(format!("Note: {note}"));
        }

        let mut journey = list_table(&["Signal", "Fired"]);
        for signal in EcommerceSignal::ALL {
            let fired = audit.ecommerce_journey.get(signal);
            journey.add_row(vec![
                Cell::new(signal.event_name()),
                if fired {
                    Cell::new("yes").fg(Color::Green)
                } else {
                    Cell::new("no").fg(Color::Red)
                },
            ]);
        }
        lines.push(String::new());
        lines.push(journey.to_string());

        if !audit.signal_failures.is_empty() {
            let mut failures = list_table(&["Severity", "Issue", "Monthly loss"]);
            for failure in &audit.signal_failures {
                failures.add_row(vec![
                    severity_cell(failure.severity),
                    Cell::new(truncate(&failure.title, 48)),
                    Cell::new(dollars(failure.monthly_loss)),
                ]);
            }
            lines.push(String::new());
            lines.push(failures.to_string());
        }

        if let Some(location) = &self.report_location {
            lines.push(format!("\nAudit saved: {location}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(
    args: AuditArgs,
    ctx: AppContext,
    cancel: &CancellationToken,
    json_mode: bool,
) -> Result<ExitCode> {
    let client = ClientRevenueData::new(args.revenue, args.ad_spend);
    client
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid client data")?;

    let engine = ctx.audit_engine();
    let audit = match engine.perform_audit(&args.url, &client, cancel).await {
        Ok(audit) => audit,
        Err(crate::services::AuditError::InvalidTarget(err)) => {
            return Err(err).context("Audit could not start");
        }
        Err(err) => engine.degraded(&args.url, &err),
    };

    let sink = ctx.report_sink();
    let name = format!("revenue-audit-{}.json", Utc::now().timestamp_millis());
    let report_location = match sink.write_json(&name, &serde_json::to_value(&audit)?).await {
        Ok(location) => Some(location),
        Err(err) => {
            warn!(error = %err, "failed to save audit result");
            None
        }
    };

    let minimum = ctx.config.verification.minimum_passing_health;
    let passing = audit.signal_health >= minimum;
    output(
        &AuditOutput {
            audit,
            report_location,
            minimum_passing_health: minimum,
        },
        json_mode,
    );

    Ok(if passing {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
