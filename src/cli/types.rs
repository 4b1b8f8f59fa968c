//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::browser::DriverKind;
use crate::cli::commands::{
    audit::AuditArgs, config::ConfigArgs, known_config::KnownConfigArgs, repair::RepairArgs,
    verify::VerifyArgs,
};

#[derive(Parser, Debug)]
#[command(name = "signal-lab")]
#[command(about = "Signal Lab - revenue signal audit, repair and verification", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .signal-lab/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Browser driver used for live audits
    #[arg(long, global = true, value_enum)]
    pub driver: Option<DriverKind>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the audit → repair → deploy loop until signal health is restored
    Verify(VerifyArgs),

    /// Run a single signal audit and save the result
    Audit(AuditArgs),

    /// Generate repairs from a saved audit result
    Repair(RepairArgs),

    /// Inspect the known-configuration table
    KnownConfig(KnownConfigArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
