//! Implementation of the `signal-lab verify` command.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;
use tokio_util::sync::CancellationToken;

use crate::cli::context::AppContext;
use crate::cli::output::{
    dollars, health_cell, heading, list_table, output, styled_status, CommandOutput,
};
use crate::domain::models::{ClientRevenueData, Config, FinalReport, FinalStatus};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Store URL to verify (absolute http/https)
    pub url: String,

    /// Monthly revenue in dollars, used for leakage estimates
    #[arg(long)]
    pub revenue: Option<f64>,

    /// Monthly ad spend in dollars
    #[arg(long)]
    pub ad_spend: Option<f64>,

    /// Override the iteration cap
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override the delay between iterations in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutput {
    pub report: FinalReport,
    pub report_location: Option<String>,
    #[serde(skip)]
    pub max_iterations: u32,
    #[serde(skip)]
    pub minimum_passing_health: u32,
}

impl CommandOutput for VerifyOutput {
    fn to_human(&self) -> String {
        let summary = &self.report.session_summary;
        let status = summary.final_status.unwrap_or(FinalStatus::Error);

        let mut lines = vec![
            heading(&format!("Session {}", summary.session_id)),
            format!("Status:            {}", styled_status(status)),
            format!("Target:            {}", summary.target_url),
            format!(
                "Iterations:        {}/{}",
                summary.total_iterations, self.max_iterations
            ),
            format!("Final health:      {}%", summary.final_signal_health),
            format!("Revenue recovered: {}/month", dollars(summary.revenue_recovered)),
            format!("Issues fixed:      {}", summary.total_issues_fixed),
            format!("Duration:          {}", summary.duration),
        ];
        if let Some(error) = &summary.error {
            lines.push(format!("Error:             {error}"));
        }

        if !self.report.performance_metrics.signal_health_progression.is_empty() {
            let mut table = list_table(&["Iteration", "Health", "Change", "Monthly leakage"]);
            let leakage = &self.report.performance_metrics.revenue_impact_reduction;
            for (point, loss) in self
                .report
                .performance_metrics
                .signal_health_progression
                .iter()
                .zip(leakage)
            {
                table.add_row(vec![
                    Cell::new(point.iteration),
                    health_cell(point.health, self.minimum_passing_health),
                    Cell::new(format!("{:+}", point.improvement)),
                    Cell::new(dollars(loss.monthly_leakage)),
                ]);
            }
            lines.push(String::new());
            lines.push(table.to_string());
        }

        if let Some(value) = &self.report.business_value {
            lines.push(String::new());
            lines.push(heading("Business value"));
            lines.push(format!(
                "Annual recovery: {}  ROI: {}%  Payback: {}  Algorithm: {}",
                dollars(value.annual_revenue_recovered),
                value.roi,
                value.time_to_payback,
                value.algorithm_improvement
            ));
        }

        lines.push(String::new());
        lines.push(heading("Recommendations"));
        lines.extend(self.report.recommendations.iter().map(|r| format!("  - {r}")));

        if let Some(location) = &self.report_location {
            lines.push(format!("\nReport saved: {location}"));
        }
        lines.join("\n")
    }
}

/// Apply command-line overrides and re-check the result against config validation.
fn apply_overrides(args: &VerifyArgs, config: &mut Config) -> Result<()> {
    if let Some(max) = args.max_iterations {
        config.verification.max_iterations = max;
    }
    if let Some(delay) = args.delay_ms {
        config.verification.iteration_delay_ms = delay;
    }
    ConfigLoader::validate(config).context("Invalid verify options")?;
    Ok(())
}

pub async fn execute(
    args: VerifyArgs,
    mut ctx: AppContext,
    cancel: &CancellationToken,
    json_mode: bool,
) -> Result<ExitCode> {
    apply_overrides(&args, &mut ctx.config)?;

    let orchestrator = ctx.orchestrator()?;
    let client = ClientRevenueData::new(args.revenue, args.ad_spend);
    let outcome = orchestrator
        .run(&args.url, client, cancel)
        .await
        .context("Verification could not start")?;

    let status = outcome.final_status();
    output(
        &VerifyOutput {
            report: outcome.report,
            report_location: outcome.report_location,
            max_iterations: ctx.config.verification.max_iterations,
            minimum_passing_health: ctx.config.verification.minimum_passing_health,
        },
        json_mode,
    );

    Ok(if status.is_passing() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
