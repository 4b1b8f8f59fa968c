//! Common test utilities for integration tests
//!
//! Provides shared fixtures for the verification loop and audit engine
//! tests: a fast configuration, scripted storefronts and a fully wired
//! orchestrator backed by in-memory adapters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use signal_lab::adapters::browser::{DriverProbe, PageScript, ScriptedBrowserDriver};
use signal_lab::adapters::{FixedClock, MemoryReportSink};
use signal_lab::domain::models::{
    Config, DeploymentMode, DeploymentOutcome, DeploymentStatus, EcommerceJourney,
    KnownConfigurationEntry, RepairReport, RevenueLeakage, TrackingSetup,
};
use signal_lab::domain::ports::{Clock, FixDeployer};
use signal_lab::domain::{DomainError, DomainResult};
use signal_lab::services::{deployment, KnownConfigurationStore, SignalAuditEngine};
use signal_lab::services::VerificationLoopOrchestrator;

/// Noon on the day the built-in entries were verified.
pub fn seed_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 7, 12, 0, 0).unwrap()
}

/// Configuration with no delays, short stage timeouts and report-only deployment.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.verification.iteration_delay_ms = 0;
    config.verification.session_timeout_secs = 30;
    config.audit.navigation_timeout_ms = 500;
    config.audit.stage_timeout_ms = 200;
    config.audit.homepage_settle_ms = 0;
    config.audit.settle_ms = 0;
    config.deployment.mode = DeploymentMode::ReportOnly;
    config
}

pub fn tracked_homepage() -> PageScript {
    PageScript::new()
        .with_tag_manager()
        .with_inline_script("gtag('config', 'G-ABC1234XYZ');")
        .with_request("https://www.googletagmanager.com/gtm.js?id=GTM-TEST123")
        .with_product_link("/products/widget")
}

/// Storefront where every ecommerce signal fires.
pub fn complete_storefront() -> ScriptedBrowserDriver {
    ScriptedBrowserDriver::new()
        .page("/", tracked_homepage())
        .page(
            "/products/widget",
            PageScript::new()
                .with_tag_manager()
                .with_push("view_item")
                .with_add_to_cart("add_to_cart"),
        )
        .page("/cart", PageScript::new().with_tag_manager().with_push("view_cart"))
        .page(
            "/checkout",
            PageScript::new()
                .with_tag_manager()
                .with_push("begin_checkout")
                .with_inline_script("dataLayer.push({event: 'purchase', transaction_id: t});"),
        )
}

/// Known entry with the given journey and a matching health score.
pub fn known_entry(
    domain: &str,
    last_verified: NaiveDate,
    journey: EcommerceJourney,
) -> KnownConfigurationEntry {
    KnownConfigurationEntry {
        domain: domain.to_string(),
        last_verified,
        signal_health: journey.signal_health(),
        setup: TrackingSetup::default(),
        ecommerce_journey: journey,
        revenue_leakage: RevenueLeakage {
            monthly_loss: 0,
            annual_loss: 0,
            signal_loss_percentage: 0.0,
            ad_spend_waste: None,
            breakdown: None,
            platform_discrepancy: None,
            note: None,
        },
        status: "TEST".to_string(),
    }
}

/// Deployer whose first `failures` calls fail; later calls report not attempted.
pub struct FlakyDeployer {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyDeployer {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FixDeployer for FlakyDeployer {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn deploy(&self, _report: &RepairReport) -> DomainResult<DeploymentStatus> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(DomainError::Deployment(format!(
                "theme upload rejected (attempt {})",
                call + 1
            )));
        }
        Ok(DeploymentStatus {
            status: DeploymentOutcome::NotAttempted,
            tag_manager_deployment: false,
            theme_deployment: false,
            timestamp: seed_day(),
            simulated_deployment: false,
            note: None,
        })
    }
}

/// Orchestrator wired to in-memory adapters, plus handles to inspect them.
pub struct Harness {
    pub orchestrator: VerificationLoopOrchestrator,
    pub sink: Arc<MemoryReportSink>,
    pub clock: FixedClock,
    pub probe: DriverProbe,
}

pub fn harness(
    driver: ScriptedBrowserDriver,
    store: KnownConfigurationStore,
    config: &Config,
    now: DateTime<Utc>,
) -> Harness {
    let clock = FixedClock::at(now);
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let deployer = deployment::from_config(&config.deployment, Arc::clone(&shared_clock));
    harness_with_deployer(driver, store, config, clock, deployer)
}

/// Like [`harness`], with an explicit deployer.
pub fn harness_with_deployer(
    driver: ScriptedBrowserDriver,
    store: KnownConfigurationStore,
    config: &Config,
    clock: FixedClock,
    deployer: Arc<dyn FixDeployer>,
) -> Harness {
    let probe = driver.probe();
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let sink = Arc::new(MemoryReportSink::new());
    let engine = Arc::new(SignalAuditEngine::new(
        Arc::new(driver),
        config.audit.clone(),
        config.scoring.clone(),
    ));

    let orchestrator = VerificationLoopOrchestrator::new(
        engine,
        Arc::new(store),
        deployer,
        sink.clone(),
        shared_clock,
        config,
    );

    Harness {
        orchestrator,
        sink,
        clock,
        probe,
    }
}
