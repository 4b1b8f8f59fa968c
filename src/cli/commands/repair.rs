//! Implementation of the `signal-lab repair` command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;

use crate::adapters::FileReportSink;
use crate::cli::context::AppContext;
use crate::cli::output::{heading, list_table, output, truncate, CommandOutput};
use crate::domain::models::{AuditResult, OutputFormat, RepairConfig, RepairPlatform, RepairReport};
use crate::domain::ports::ReportSink;
use crate::services::RepairEngine;

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Saved audit result (JSON)
    pub audit_file: PathBuf,

    /// Target platform (shopify, woocommerce, custom)
    #[arg(short, long)]
    pub platform: Option<RepairPlatform>,

    /// Wrapping for generic snippets (liquid, html, js)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutput {
    pub report: RepairReport,
    pub report_location: String,
}

impl CommandOutput for RepairOutput {
    fn to_human(&self) -> String {
        let summary = &self.report.summary;
        let mut lines = vec![
            heading("Repair plan"),
            format!(
                "{} fix(es) for {} issue(s), estimated {}",
                summary.total_fixes, summary.total_issues, summary.estimated_time
            ),
            format!(
                "Data accuracy: {}%  Conversion tracking: {}  Ad optimization: {}",
                summary.business_value.data_accuracy,
                summary.business_value.conversion_tracking,
                summary.business_value.ad_optimization
            ),
        ];

        if !self.report.fixes.is_empty() {
            let mut table = list_table(&["Category", "Issue", "Install location"]);
            for fix in self.report.fixes.iter() {
                table.add_row(vec![
                    Cell::new(format!("{:?}", fix.category)),
                    Cell::new(truncate(&fix.issue, 36)),
                    Cell::new(truncate(&fix.install_location, 48)),
                ]);
            }
            lines.push(String::new());
            lines.push(table.to_string());
        }

        lines.push(format!("\nRepair instructions saved: {}", self.report_location));
        lines.join("\n")
    }
}

/// `<dir>/<stem>-repairs.json` next to the audit file.
fn repairs_target(audit_file: &Path) -> (PathBuf, String) {
    let dir = audit_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let stem = audit_file
        .file_stem()
        .map_or_else(|| "audit".to_string(), |s| s.to_string_lossy().into_owned());
    (dir, format!("{stem}-repairs.json"))
}

pub async fn execute(args: RepairArgs, ctx: AppContext, json_mode: bool) -> Result<ExitCode> {
    let raw = tokio::fs::read_to_string(&args.audit_file)
        .await
        .with_context(|| format!("Failed to read {}", args.audit_file.display()))?;
    let audit: AuditResult = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a saved audit result", args.audit_file.display()))?;

    let config = RepairConfig {
        platform: args.platform.unwrap_or(ctx.config.repair.platform),
        output_format: args.format.unwrap_or(ctx.config.repair.output_format),
    };
    let report = RepairEngine::new(config).generate(&audit);

    let (dir, name) = repairs_target(&args.audit_file);
    let report_location = FileReportSink::new(dir)
        .write_json(&name, &serde_json::to_value(&report)?)
        .await
        .context("Failed to save repair instructions")?;

    output(
        &RepairOutput {
            report,
            report_location,
        },
        json_mode,
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_target_sits_next_to_audit() {
        let (dir, name) = repairs_target(Path::new("reports/revenue-audit-1700000000000.json"));
        assert_eq!(dir, PathBuf::from("reports"));
        assert_eq!(name, "revenue-audit-1700000000000-repairs.json");

        let (dir, name) = repairs_target(Path::new("audit.json"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "audit-repairs.json");
    }
}
