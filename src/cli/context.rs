//! Wiring shared by the CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::adapters::browser::DriverKind;
use crate::adapters::{FileReportSink, SystemClock};
use crate::domain::models::Config;
use crate::domain::ports::Clock;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{deployment, KnownConfigurationStore, SignalAuditEngine};
use crate::services::VerificationLoopOrchestrator;

/// Loaded configuration plus the selected driver.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub driver: DriverKind,
}

impl AppContext {
    pub fn load(config_path: Option<&Path>, driver: Option<DriverKind>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self {
            config,
            driver: driver.unwrap_or_default(),
        })
    }

    pub fn audit_engine(&self) -> Arc<SignalAuditEngine> {
        debug!(driver = ?self.driver, "building audit engine");
        Arc::new(SignalAuditEngine::new(
            self.driver.build(),
            self.config.audit.clone(),
            self.config.scoring.clone(),
        ))
    }

    /// The configured YAML table, or the built-in seed when no path is set.
    pub fn known_configurations(&self) -> Result<Arc<KnownConfigurationStore>> {
        let store = match &self.config.known_configurations.path {
            Some(path) => KnownConfigurationStore::from_yaml_file(path)?,
            None => KnownConfigurationStore::builtin(),
        };
        debug!(entries = store.len(), "known configurations loaded");
        Ok(Arc::new(store))
    }

    pub fn report_sink(&self) -> Arc<FileReportSink> {
        Arc::new(FileReportSink::new(&self.config.reports.directory))
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }

    pub fn orchestrator(&self) -> Result<VerificationLoopOrchestrator> {
        let clock = self.clock();
        Ok(VerificationLoopOrchestrator::new(
            self.audit_engine(),
            self.known_configurations()?,
            deployment::from_config(&self.config.deployment, Arc::clone(&clock)),
            self.report_sink(),
            clock,
            &self.config,
        ))
    }
}
