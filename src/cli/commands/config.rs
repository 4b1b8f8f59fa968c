//! Implementation of the `signal-lab config` commands.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (defaults, files, environment merged)
    Show,
}

#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct ConfigShowOutput {
    pub config: Config,
    #[serde(skip)]
    pub rendered: String,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        self.rendered.trim_end().to_string()
    }
}

pub fn execute(args: ConfigArgs, ctx: AppContext, json_mode: bool) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Show => {
            let rendered =
                serde_yaml::to_string(&ctx.config).context("Failed to render configuration")?;
            output(
                &ConfigShowOutput {
                    config: ctx.config,
                    rendered,
                },
                json_mode,
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
