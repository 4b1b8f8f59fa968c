//! End-to-end tests for the verification loop.
//!
//! Every test wires the orchestrator to a scripted browser, an in-memory
//! report sink and a manually driven clock.

mod common;

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use signal_lab::adapters::browser::ScriptedBrowserDriver;
use signal_lab::adapters::FixedClock;
use signal_lab::domain::models::{
    ClientRevenueData, DeploymentOutcome, EcommerceJourney, EcommerceSignal, FinalStatus,
};
use signal_lab::domain::DomainError;
use signal_lab::services::KnownConfigurationStore;

use common::{
    complete_storefront, fast_config, harness, harness_with_deployer, known_entry, seed_day,
    FlakyDeployer,
};

fn seed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 7).unwrap()
}

#[tokio::test]
async fn test_verified_domain_succeeds_from_cache() {
    let h = harness(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::builtin(),
        &fast_config(),
        seed_day(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://lwscientific.com",
            ClientRevenueData::new(Some(50_000.0), None),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::Success);
    assert_eq!(outcome.session.iterations.len(), 1);

    let audit = outcome.session.iterations[0]
        .audit_results
        .as_ref()
        .expect("audit recorded");
    assert!(audit.from_cache);
    assert_eq!(audit.signal_health, 100);
    assert_eq!(audit.revenue_leakage.monthly_loss, 600);
    assert!(outcome.session.iterations[0].repair_results.is_none());

    assert_eq!(h.probe.launches(), 0, "cache hit must not open a browser");
    assert_eq!(outcome.report.session_summary.final_signal_health, 100);
    assert_eq!(outcome.report.recommendations.len(), 4);
}

#[tokio::test]
async fn test_partial_domain_runs_to_iteration_cap() {
    let config = fast_config();
    let h = harness(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::builtin(),
        &config,
        seed_day(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://store.labessentials.com",
            ClientRevenueData::new(Some(0.0), None),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::MaxIterationsReached);
    assert_eq!(
        outcome.session.iterations.len(),
        config.verification.max_iterations as usize
    );

    for record in &outcome.session.iterations {
        let audit = record.audit_results.as_ref().expect("audit recorded");
        assert_eq!(audit.signal_health, 60);
        assert_eq!(audit.revenue_leakage.monthly_loss, 0);
        assert!(audit.revenue_leakage.note.is_some());

        let repairs = record.repair_results.as_ref().expect("repairs generated");
        assert_eq!(repairs.summary.total_fixes, 2);
        assert_eq!(
            repairs.fixed_signals(),
            vec![EcommerceSignal::AddToCart, EcommerceSignal::BeginCheckout]
        );

        let deployment = record.deployment_status.as_ref().expect("deployment recorded");
        assert_eq!(deployment.status, DeploymentOutcome::NotAttempted);
    }

    assert_eq!(outcome.session.total_issues_fixed, 10);
    assert_eq!(outcome.session.revenue_recovered, 0);
    assert_eq!(h.probe.launches(), 0);
}

#[tokio::test]
async fn test_unreachable_site_degrades_each_iteration() {
    let mut config = fast_config();
    config.verification.max_iterations = 3;
    let h = harness(
        ScriptedBrowserDriver::unreachable("net::ERR_NAME_NOT_RESOLVED"),
        KnownConfigurationStore::builtin(),
        &config,
        seed_day(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://unknown-store.example.com",
            ClientRevenueData::new(Some(25_000.0), None),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::MaxIterationsReached);
    assert_eq!(outcome.session.iterations.len(), 3);
    for record in &outcome.session.iterations {
        assert!(record.error.is_none());
        let audit = record.audit_results.as_ref().expect("degraded audit recorded");
        assert_eq!(audit.signal_health, 0);
        assert_eq!(audit.signal_failures.len(), 1);
        assert!(audit.is_system_failure());
    }
    assert_eq!(h.probe.launches(), 3);
    assert_eq!(outcome.report.session_summary.final_signal_health, 0);
}

#[tokio::test]
async fn test_stale_entry_falls_back_to_live_audit() {
    let later = Utc.with_ymd_and_hms(2026, 1, 9, 9, 0, 0).unwrap();
    let h = harness(
        complete_storefront(),
        KnownConfigurationStore::builtin(),
        &fast_config(),
        later,
    );

    let outcome = h
        .orchestrator
        .run(
            "https://lwscientific.com",
            ClientRevenueData::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    let audit = outcome.session.iterations[0]
        .audit_results
        .as_ref()
        .expect("audit recorded");
    assert!(!audit.from_cache);
    assert_eq!(audit.signal_health, 100);
    assert_eq!(outcome.final_status(), FinalStatus::Success);
    assert_eq!(h.probe.launches(), 1);
    assert_eq!(h.probe.open_sessions(), 0);
}

#[tokio::test]
async fn test_recovered_revenue_after_cache_expires() {
    let mut config = fast_config();
    // 13 hours: the second iteration runs 25 hours after verification.
    config.verification.iteration_delay_ms = 13 * 60 * 60 * 1000;
    let journey = EcommerceJourney {
        view_cart: true,
        ..EcommerceJourney::default()
    };
    let store =
        KnownConfigurationStore::new([known_entry("shop.example.com", seed_date(), journey)]);
    let h = harness(complete_storefront(), store, &config, seed_day());

    let outcome = h
        .orchestrator
        .run(
            "https://shop.example.com",
            ClientRevenueData::new(Some(50_000.0), None),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::Success);
    assert_eq!(outcome.session.iterations.len(), 2);

    let first = &outcome.session.iterations[0];
    let second = &outcome.session.iterations[1];
    assert_eq!(first.health(), 20);
    assert_eq!(first.signal_improvement, 0);
    assert_eq!(first.monthly_leakage(), 2000);
    assert_eq!(first.fixes_generated(), 4);
    assert_eq!(second.health(), 100);
    assert_eq!(second.signal_improvement, 80);
    assert_eq!(second.monthly_leakage(), 600);

    assert_eq!(outcome.session.revenue_recovered, 1400);
    assert_eq!(outcome.report.session_summary.revenue_recovered, 1400);
    let value = outcome.report.business_value.as_ref().expect("business value");
    assert_eq!(value.annual_revenue_recovered, 1400 * 12);
    assert_eq!(h.clock.sleeps().len(), 1);
}

#[tokio::test]
async fn test_minimum_health_is_acceptable() {
    let journey = EcommerceJourney {
        begin_checkout: false,
        ..EcommerceJourney::complete()
    };
    let store =
        KnownConfigurationStore::new([known_entry("almost.example.com", seed_date(), journey)]);
    let config = fast_config();
    let h = harness(ScriptedBrowserDriver::new(), store, &config, seed_day());

    let outcome = h
        .orchestrator
        .run(
            "https://almost.example.com",
            ClientRevenueData::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::Acceptable);
    let health = outcome.session.final_health();
    assert!(health >= config.verification.minimum_passing_health);
    assert!(health < config.verification.target_signal_health);
    assert_eq!(outcome.session.iterations.len(), 1);
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_iteration() {
    let h = harness(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::builtin(),
        &fast_config(),
        seed_day(),
    );
    let cancel = CancellationToken::new();

    let err = h
        .orchestrator
        .run("not a url", ClientRevenueData::default(), &cancel)
        .await
        .expect_err("invalid url");
    assert!(matches!(err, DomainError::InvalidUrl { .. }));

    let err = h
        .orchestrator
        .run(
            "https://shop.example.com",
            ClientRevenueData::new(Some(-5.0), None),
            &cancel,
        )
        .await
        .expect_err("negative revenue");
    assert!(matches!(err, DomainError::InvalidClientData(_)));

    assert_eq!(h.sink.len().await, 0);
    assert_eq!(h.probe.launches(), 0);
}

#[tokio::test]
async fn test_cancellation_ends_in_error_and_closes_browser() {
    let cancel = CancellationToken::new();
    let driver = ScriptedBrowserDriver::new().cancel_on_visit("/", cancel.clone());
    let h = harness(driver, KnownConfigurationStore::empty(), &fast_config(), seed_day());

    let outcome = h
        .orchestrator
        .run("https://shop.example.com", ClientRevenueData::default(), &cancel)
        .await
        .expect("session finalizes");

    assert_eq!(outcome.final_status(), FinalStatus::Error);
    assert!(outcome
        .session
        .error
        .as_deref()
        .is_some_and(|e| e.contains("cancelled")));
    assert_eq!(h.probe.launches(), 1);
    assert_eq!(h.probe.open_sessions(), 0);
    assert!(outcome.report_location.is_some());
}

#[tokio::test]
async fn test_session_timeout_ends_in_error() {
    let mut config = fast_config();
    config.verification.session_timeout_secs = 1;
    config.audit.navigation_timeout_ms = 60_000;
    let driver = ScriptedBrowserDriver::new().hanging_page("/");
    let h = harness(driver, KnownConfigurationStore::empty(), &config, seed_day());

    let outcome = h
        .orchestrator
        .run(
            "https://slow.example.com",
            ClientRevenueData::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("session finalizes");

    assert_eq!(outcome.final_status(), FinalStatus::Error);
    assert!(outcome
        .session
        .error
        .as_deref()
        .is_some_and(|e| e.contains("timed out")));
    assert_eq!(h.probe.open_sessions(), 0);
}

#[tokio::test]
async fn test_reports_are_persisted_per_iteration_and_once_at_end() {
    let mut config = fast_config();
    config.verification.max_iterations = 2;
    let h = harness(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::builtin(),
        &config,
        seed_day(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://store.labessentials.com",
            ClientRevenueData::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    let id = &outcome.session.session_id;
    let names = h.sink.names().await;
    assert_eq!(
        names,
        vec![
            format!("{id}-iteration-1-repairs.json"),
            format!("{id}-iteration-2-repairs.json"),
            format!("{id}-FINAL-REPORT.json"),
        ]
    );

    let stored = h
        .sink
        .get(&format!("{id}-FINAL-REPORT.json"))
        .await
        .expect("final report stored");
    assert_eq!(stored["sessionSummary"]["finalStatus"], "MAX_ITERATIONS_REACHED");
    assert_eq!(stored["sessionSummary"]["totalIterations"], 2);
    assert_eq!(
        stored["detailedIterations"].as_array().map(Vec::len),
        Some(2)
    );
}

#[tokio::test]
async fn test_cached_health_follows_recorded_journey() {
    let journey = EcommerceJourney {
        add_to_cart: false,
        begin_checkout: false,
        ..EcommerceJourney::complete()
    };
    let mut entry = known_entry("drifted.example.com", seed_date(), journey);
    entry.signal_health = 70;
    let h = harness(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::new([entry]),
        &fast_config(),
        seed_day(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://drifted.example.com",
            ClientRevenueData::new(Some(50_000.0), None),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    let audit = outcome.session.iterations[0]
        .audit_results
        .as_ref()
        .expect("audit recorded");
    assert!(audit.from_cache);
    assert_eq!(audit.signal_health, journey.signal_health());
    assert_eq!(audit.signal_health, 60);
    // loss = min(15 + 40, 50) = 50; 50000 * 0.5 * 0.08
    assert_eq!(audit.revenue_leakage.monthly_loss, 2000);
}

#[tokio::test]
async fn test_failed_deployment_is_recorded_and_loop_continues() {
    let mut config = fast_config();
    config.verification.max_iterations = 3;
    let deployer = Arc::new(FlakyDeployer::failing_first(1));
    let h = harness_with_deployer(
        ScriptedBrowserDriver::new(),
        KnownConfigurationStore::builtin(),
        &config,
        FixedClock::at(seed_day()),
        deployer.clone(),
    );

    let outcome = h
        .orchestrator
        .run(
            "https://store.labessentials.com",
            ClientRevenueData::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert_eq!(outcome.final_status(), FinalStatus::MaxIterationsReached);
    assert!(outcome.session.error.is_none());
    assert_eq!(outcome.session.iterations.len(), 3);
    assert_eq!(deployer.calls(), 3);

    let failed = &outcome.session.iterations[0];
    assert!(failed
        .error
        .as_deref()
        .is_some_and(|e| e.contains("Fix deployment failed")));
    assert_eq!(failed.health(), 60, "audit kept on a failed iteration");
    assert!(failed.repair_results.is_some());
    assert!(failed.deployment_status.is_none());

    for record in &outcome.session.iterations[1..] {
        assert!(record.error.is_none());
        let deployment = record.deployment_status.as_ref().expect("deployment recorded");
        assert_eq!(deployment.status, DeploymentOutcome::NotAttempted);
    }

    let id = &outcome.session.session_id;
    let stored = h
        .sink
        .get(&format!("{id}-FINAL-REPORT.json"))
        .await
        .expect("final report stored");
    assert_eq!(stored["sessionSummary"]["finalStatus"], "MAX_ITERATIONS_REACHED");
    assert!(stored["detailedIterations"][0]["error"].is_string());
}
