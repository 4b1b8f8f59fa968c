//! Signal Lab - revenue signal audit, repair and verification
//!
//! Signal Lab drives a storefront through a shopping journey, checks which
//! ecommerce analytics signals fire, estimates the revenue those gaps cost,
//! generates tracking repairs, and repeats until signal health is restored.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports the services depend on
//! - **Service Layer** (`services`): audit, repair, deployment and the verification loop
//! - **Adapters** (`adapters`): browser drivers, report sinks and clocks
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use signal_lab::cli::AppContext;
//! use signal_lab::domain::models::ClientRevenueData;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::load(None, None)?;
//!     let outcome = ctx
//!         .orchestrator()?
//!         .run("https://store.example", ClientRevenueData::default(), &CancellationToken::new())
//!         .await?;
//!     println!("{}", outcome.final_status().as_str());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AuditResult, ClientRevenueData, Config, FinalReport, FinalStatus, RepairReport,
    VerificationSession,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    KnownConfigurationStore, RepairEngine, SignalAuditEngine, VerificationLoopOrchestrator,
    VerificationOutcome,
};
