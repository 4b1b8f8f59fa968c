//! Fix deployers.
//!
//! Neither deployer touches the target site. The simulated one sleeps on
//! the injected clock and draws a random outcome; the report-only one hands
//! the fixes off for manual or CI deployment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    DeploymentConfig, DeploymentMode, DeploymentOutcome, DeploymentStatus, RepairReport,
};
use crate::domain::ports::{Clock, FixDeployer};

/// Build the deployer selected by `config.mode`.
pub fn from_config(config: &DeploymentConfig, clock: Arc<dyn Clock>) -> Arc<dyn FixDeployer> {
    match config.mode {
        DeploymentMode::Simulated => Arc::new(SimulatedDeployer::new(
            clock,
            config.success_rate,
            Duration::from_millis(config.simulated_duration_ms),
        )),
        DeploymentMode::ReportOnly => Arc::new(ReportOnlyDeployer::new(clock)),
    }
}

pub struct SimulatedDeployer {
    clock: Arc<dyn Clock>,
    success_rate: f64,
    duration: Duration,
}

impl SimulatedDeployer {
    pub fn new(clock: Arc<dyn Clock>, success_rate: f64, duration: Duration) -> Self {
        Self {
            clock,
            success_rate: success_rate.clamp(0.0, 1.0),
            duration,
        }
    }
}

#[async_trait]
impl FixDeployer for SimulatedDeployer {
    fn name(&self) -> &'static str {
        "simulated"
    }

    #[instrument(skip(self, report), fields(fixes = report.summary.total_fixes))]
    async fn deploy(&self, report: &RepairReport) -> DomainResult<DeploymentStatus> {
        let succeeded = rand::thread_rng().gen_bool(self.success_rate);
        self.clock.sleep(self.duration).await;

        let has_tag_manager = !report.fixes.tag_manager.is_empty();
        let has_theme = !report.fixes.ecommerce.is_empty();
        let status = if succeeded {
            info!("simulated deployment succeeded");
            DeploymentOutcome::Success
        } else {
            warn!("simulated deployment failed");
            DeploymentOutcome::Failed
        };

        Ok(DeploymentStatus {
            status,
            tag_manager_deployment: succeeded && has_tag_manager,
            theme_deployment: succeeded && has_theme,
            timestamp: self.clock.now(),
            simulated_deployment: true,
            note: Some("Simulated deployment; no changes were made to the site".to_string()),
        })
    }
}

pub struct ReportOnlyDeployer {
    clock: Arc<dyn Clock>,
}

impl ReportOnlyDeployer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl FixDeployer for ReportOnlyDeployer {
    fn name(&self) -> &'static str {
        "report_only"
    }

    async fn deploy(&self, report: &RepairReport) -> DomainResult<DeploymentStatus> {
        info!(
            fixes = report.summary.total_fixes,
            "fixes left for manual deployment"
        );
        Ok(DeploymentStatus {
            status: DeploymentOutcome::NotAttempted,
            tag_manager_deployment: false,
            theme_deployment: false,
            timestamp: self.clock.now(),
            simulated_deployment: false,
            note: Some("Apply the generated repair report manually or from CI".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::domain::models::{AuditResult, EcommerceJourney, RepairConfig, RevenueLeakage};
    use crate::services::repair_engine::generate_repairs;
    use chrono::{TimeZone, Utc};

    fn report() -> RepairReport {
        let mut journey = EcommerceJourney::complete();
        journey.add_to_cart = false;
        let audit = AuditResult {
            timestamp: Utc::now(),
            target_url: "https://shop.example.com".to_string(),
            signal_health: journey.signal_health(),
            revenue_leakage: RevenueLeakage::zero(15.0, "test"),
            signal_failures: Vec::new(),
            ecommerce_journey: journey,
            network_capture: Vec::new(),
            ad_platform_impact: None,
            from_cache: false,
            setup: None,
        };
        generate_repairs(&audit, &RepairConfig::default())
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_simulated_success_sleeps_on_clock() {
        let clock = clock();
        let deployer = SimulatedDeployer::new(clock.clone(), 1.0, Duration::from_secs(2));
        let status = deployer.deploy(&report()).await.unwrap();

        assert_eq!(status.status, DeploymentOutcome::Success);
        assert!(status.simulated_deployment);
        assert!(status.theme_deployment);
        assert!(!status.tag_manager_deployment);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let deployer = SimulatedDeployer::new(clock(), 0.0, Duration::ZERO);
        let status = deployer.deploy(&report()).await.unwrap();
        assert_eq!(status.status, DeploymentOutcome::Failed);
        assert!(!status.theme_deployment);
    }

    #[tokio::test]
    async fn test_report_only_never_deploys() {
        let config = DeploymentConfig {
            mode: DeploymentMode::ReportOnly,
            ..DeploymentConfig::default()
        };
        let deployer = from_config(&config, clock());
        assert_eq!(deployer.name(), "report_only");
        let status = deployer.deploy(&report()).await.unwrap();
        assert_eq!(status.status, DeploymentOutcome::NotAttempted);
        assert!(!status.simulated_deployment);
    }
}
