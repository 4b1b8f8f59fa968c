//! Implementation of the `signal-lab known-config` commands.

use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color};

use crate::cli::context::AppContext;
use crate::cli::output::{dollars, health_cell, heading, list_table, output, CommandOutput};
use crate::domain::models::KnownConfigurationEntry;
use crate::services::is_fresh;

#[derive(Args, Debug)]
pub struct KnownConfigArgs {
    #[command(subcommand)]
    pub command: KnownConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum KnownConfigCommands {
    /// List the known-configuration table
    List,
    /// Look up the entry that applies to a URL
    Check {
        /// Store URL (absolute http/https)
        url: String,
    },
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownConfigRow {
    #[serde(flatten)]
    pub entry: KnownConfigurationEntry,
    pub age_hours: f64,
    pub fresh: bool,
}

impl KnownConfigRow {
    fn new(entry: &KnownConfigurationEntry, max_age_hours: f64) -> Self {
        let now = Utc::now();
        Self {
            entry: entry.clone(),
            age_hours: entry.age_hours(now),
            fresh: is_fresh(entry, now, max_age_hours),
        }
    }
}

fn fresh_cell(fresh: bool) -> Cell {
    if fresh {
        Cell::new("fresh").fg(Color::Green)
    } else {
        Cell::new("stale").fg(Color::DarkGrey)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct KnownConfigListOutput {
    pub entries: Vec<KnownConfigRow>,
    pub total: usize,
    #[serde(skip)]
    pub minimum_passing_health: u32,
}

impl CommandOutput for KnownConfigListOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No known configurations.".to_string();
        }

        let mut table = list_table(&["Domain", "Health", "Status", "Last verified", "Freshness"]);
        for row in &self.entries {
            table.add_row(vec![
                Cell::new(&row.entry.domain),
                health_cell(row.entry.signal_health, self.minimum_passing_health),
                Cell::new(&row.entry.status),
                Cell::new(row.entry.last_verified),
                fresh_cell(row.fresh),
            ]);
        }
        format!("{table}\n\nShowing {} entries", self.total)
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownConfigCheckOutput {
    pub url: String,
    pub entry: Option<KnownConfigRow>,
    pub max_age_hours: f64,
}

impl CommandOutput for KnownConfigCheckOutput {
    fn to_human(&self) -> String {
        let Some(row) = &self.entry else {
            return format!("No known configuration for {}; a live audit will run.", self.url);
        };

        let entry = &row.entry;
        let mut lines = vec![
            heading(&format!("Known configuration: {}", entry.domain)),
            format!("Signal health:  {}%", entry.signal_health),
            format!("Status:         {}", entry.status),
            format!(
                "Last verified:  {} ({:.1}h ago, limit {}h)",
                entry.last_verified, row.age_hours, self.max_age_hours
            ),
            format!(
                "Monthly loss:   {}",
                dollars(entry.revenue_leakage.monthly_loss)
            ),
        ];
        if let Some(container) = &entry.setup.web_container {
            lines.push(format!("Web container:  {container}"));
        }
        if let Some(property) = &entry.setup.ga4_property {
            lines.push(format!("GA4 property:   {property}"));
        }
        for issue in &entry.setup.issues {
            lines.push(format!("  - {issue}"));
        }
        lines.push(if row.fresh {
            "Fresh: verification will use this entry instead of a live audit.".to_string()
        } else {
            "Stale: verification will run a live audit.".to_string()
        });
        lines.join("\n")
    }
}

pub fn execute(args: KnownConfigArgs, ctx: &AppContext, json_mode: bool) -> Result<ExitCode> {
    let store = ctx.known_configurations()?;
    let max_age_hours = ctx.config.known_configurations.max_age_hours;

    match args.command {
        KnownConfigCommands::List => {
            let entries: Vec<KnownConfigRow> = store
                .entries()
                .into_iter()
                .map(|entry| KnownConfigRow::new(entry, max_age_hours))
                .collect();
            let total = entries.len();
            output(
                &KnownConfigListOutput {
                    entries,
                    total,
                    minimum_passing_health: ctx.config.verification.minimum_passing_health,
                },
                json_mode,
            );
        }
        KnownConfigCommands::Check { url } => {
            let entry = store
                .lookup(&url)
                .map(|entry| KnownConfigRow::new(entry, max_age_hours));
            output(
                &KnownConfigCheckOutput {
                    url,
                    entry,
                    max_age_hours,
                },
                json_mode,
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
