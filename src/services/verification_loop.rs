//! Verification loop orchestrator.
//!
//! Runs bounded audit → repair → deploy → reconcile cycles against one
//! store until signal health reaches the target, the minimum passing
//! threshold, or the iteration cap. Exactly one [`FinalStatus`] is set on
//! every exit path and the final report is persisted once.
//!
//! Each session is one sequential task. The only suspension points are
//! browser-driver calls, deployment and the inter-iteration delay; all of
//! them observe the cancellation token. The overall session timeout works
//! by cancelling a child token, so browser sessions are still closed when
//! it fires.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{validate_target_url, DomainError, DomainResult};
use crate::domain::models::{
    AuditResult, CachedLossEstimates, ClientRevenueData, Config, EcommerceSignal, FinalReport,
    FinalStatus, IterationRecord, KnownConfigurationEntry, RepairReport, ScoringConfig,
    SignalFailure, VerificationConfig, VerificationSession,
};
use crate::domain::ports::{Clock, FixDeployer, ReportSink};
use crate::services::audit_engine::{AuditError, SignalAuditEngine};
use crate::services::final_report::build_final_report;
use crate::services::known_configurations::{is_fresh, KnownConfigurationStore};
use crate::services::repair_engine::RepairEngine;
use crate::services::revenue_impact::estimate_leakage;

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub session: VerificationSession,
    pub report: FinalReport,
    /// Where the final report was written, if persisting it succeeded.
    pub report_location: Option<String>,
}

impl VerificationOutcome {
    pub fn final_status(&self) -> FinalStatus {
        self.session.final_status.unwrap_or(FinalStatus::Error)
    }
}

pub struct VerificationLoopOrchestrator {
    engine: Arc<SignalAuditEngine>,
    known_configurations: Arc<KnownConfigurationStore>,
    repair: RepairEngine,
    deployer: Arc<dyn FixDeployer>,
    sink: Arc<dyn ReportSink>,
    clock: Arc<dyn Clock>,
    verification: VerificationConfig,
    scoring: ScoringConfig,
    max_cache_age_hours: f64,
}

impl VerificationLoopOrchestrator {
    pub fn new(
        engine: Arc<SignalAuditEngine>,
        known_configurations: Arc<KnownConfigurationStore>,
        deployer: Arc<dyn FixDeployer>,
        sink: Arc<dyn ReportSink>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self {
            engine,
            known_configurations,
            repair: RepairEngine::new(config.repair),
            deployer,
            sink,
            clock,
            verification: config.verification.clone(),
            scoring: config.scoring.clone(),
            max_cache_age_hours: config.known_configurations.max_age_hours,
        }
    }

    /// Run one verification session.
    ///
    /// Invalid input fails before any iteration runs. Everything after that
    /// is reported through the session's final status, including
    /// cancellation and the session timeout.
    #[instrument(skip(self, client, cancel), fields(url = %target_url))]
    pub async fn run(
        &self,
        target_url: &str,
        client: ClientRevenueData,
        cancel: &CancellationToken,
    ) -> DomainResult<VerificationOutcome> {
        validate_target_url(target_url)?;
        client.validate().map_err(DomainError::InvalidClientData)?;

        let mut session = VerificationSession::new(target_url, client, self.clock.now());
        info!(
            session_id = %session.session_id,
            monthly_revenue = ?session.client_data.monthly_revenue,
            monthly_ad_spend = ?session.client_data.monthly_ad_spend,
            target = self.verification.target_signal_health,
            "verification loop started"
        );

        let loop_cancel = cancel.child_token();
        let timeout_secs = self.verification.session_timeout_secs;
        let timer = {
            let token = loop_cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
                token.cancel();
            })
        };
        let outcome = self.run_loop(&mut session, &loop_cancel).await;
        timer.abort();

        match outcome {
            Ok(status) => session.final_status = Some(status),
            Err(err) => {
                let err = match err {
                    DomainError::Cancelled if !cancel.is_cancelled() => {
                        DomainError::SessionTimeout(timeout_secs)
                    }
                    other => other,
                };
                error!(session_id = %session.session_id, error = %err, "verification loop failed");
                session.final_status = Some(FinalStatus::Error);
                session.error = Some(err.to_string());
            }
        }

        session.revenue_recovered = session.compute_revenue_recovered();
        let report = build_final_report(&session, self.clock.now(), &self.scoring);
        let report_location = self.persist_final_report(&session, &report).await;

        info!(
            session_id = %session.session_id,
            status = %report.session_summary.final_status.unwrap_or(FinalStatus::Error),
            iterations = report.session_summary.total_iterations,
            final_health = report.session_summary.final_signal_health,
            revenue_recovered = report.session_summary.revenue_recovered,
            duration = %report.session_summary.duration,
            "verification session complete"
        );

        Ok(VerificationOutcome {
            session,
            report,
            report_location,
        })
    }

    async fn run_loop(
        &self,
        session: &mut VerificationSession,
        cancel: &CancellationToken,
    ) -> DomainResult<FinalStatus> {
        let config = &self.verification;
        let delay = Duration::from_millis(config.iteration_delay_ms);
        let mut previous_health = None;

        for number in 1..=config.max_iterations {
            if cancel.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            info!(iteration = number, "starting verification cycle");

            let record = self
                .run_iteration(session, number, previous_health, cancel)
                .await?;
            let health = record.health();
            session.total_issues_fixed += record.fixes_generated();
            session.iterations.push(record);

            if health >= config.target_signal_health {
                info!(health, "target signal health reached");
                return Ok(FinalStatus::Success);
            }
            if health >= config.minimum_passing_health {
                info!(health, minimum = config.minimum_passing_health, "minimum passing health reached");
                return Ok(FinalStatus::Acceptable);
            }
            if number >= config.max_iterations {
                warn!(health, max_iterations = config.max_iterations, "iteration cap reached");
                return Ok(FinalStatus::MaxIterationsReached);
            }

            info!(health, delay_ms = config.iteration_delay_ms, "waiting for fixes to take effect");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(DomainError::Cancelled),
                () = self.clock.sleep(delay) => {}
            }
            previous_health = Some(health);
        }

        Ok(FinalStatus::MaxIterationsReached)
    }

    /// One pass. Only cancellation escapes; other errors land on the record.
    async fn run_iteration(
        &self,
        session: &VerificationSession,
        number: u32,
        previous_health: Option<u32>,
        cancel: &CancellationToken,
    ) -> DomainResult<IterationRecord> {
        let mut record = IterationRecord::new(number, self.clock.now());
        match self
            .iteration_body(session, &mut record, previous_health, cancel)
            .await
        {
            Ok(()) => Ok(record),
            Err(DomainError::Cancelled) => Err(DomainError::Cancelled),
            Err(err) => {
                error!(iteration = number, error = %err, "iteration failed");
                record.error = Some(err.to_string());
                Ok(record)
            }
        }
    }

    async fn iteration_body(
        &self,
        session: &VerificationSession,
        record: &mut IterationRecord,
        previous_health: Option<u32>,
        cancel: &CancellationToken,
    ) -> DomainResult<()> {
        let url = session.target_url.as_str();
        let audit = match self.cached_audit(url, &session.client_data) {
            Some(audit) => audit,
            None => self.live_audit(url, &session.client_data, cancel).await?,
        };

        let health = audit.signal_health;
        record.signal_improvement =
            previous_health.map_or(0, |previous| i64::from(health) - i64::from(previous));
        info!(
            health,
            improvement = record.signal_improvement,
            monthly_loss = audit.revenue_leakage.monthly_loss,
            from_cache = audit.from_cache,
            "audit complete"
        );
        let repairs =
            (health < self.verification.target_signal_health).then(|| self.repair.generate(&audit));
        record.audit_results = Some(audit);

        match repairs {
            Some(report) => {
                self.persist_repairs(session, record.number, &report).await?;
                let report = record.repair_results.insert(report);

                debug!(deployer = self.deployer.name(), "deploying fixes");
                let status = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(DomainError::Cancelled),
                    status = self.deployer.deploy(report) => status?,
                };
                info!(status = ?status.status, simulated = status.simulated_deployment, "deployment finished");
                record.deployment_status = Some(status);
            }
            None => debug!("no repairs needed"),
        }

        if previous_health.is_some() {
            if record.signal_improvement > 0 {
                info!(improvement = record.signal_improvement, "improvement detected");
            } else {
                info!("no improvement detected from last iteration");
            }
        }
        Ok(())
    }

    /// A fresh known configuration, synthesized into an audit result with
    /// dollar figures from the current client data.
    fn cached_audit(&self, url: &str, client: &ClientRevenueData) -> Option<AuditResult> {
        let now = self.clock.now();
        let entry = self.known_configurations.lookup(url)?;
        if !is_fresh(entry, now, self.max_cache_age_hours) {
            info!(domain = %entry.domain, last_verified = %entry.last_verified, "known configuration is stale; running live audit");
            return None;
        }

        info!(
            domain = %entry.domain,
            status = %entry.status,
            health = entry.journey_health(),
            "using known configuration"
        );
        let leakage = estimate_leakage(entry.journey_health(), client, &self.scoring);
        let failures = cached_failures(entry, &self.scoring.loss_estimates.cached);
        Some(AuditResult::from_known_configuration(
            url, entry, leakage, failures, now,
        ))
    }

    async fn live_audit(
        &self,
        url: &str,
        client: &ClientRevenueData,
        cancel: &CancellationToken,
    ) -> DomainResult<AuditResult> {
        match self.engine.perform_audit(url, client, cancel).await {
            Ok(audit) => Ok(audit),
            Err(AuditError::Cancelled) => Err(DomainError::Cancelled),
            Err(err) => Ok(self.engine.degraded(url, &err)),
        }
    }

    async fn persist_repairs(
        &self,
        session: &VerificationSession,
        iteration: u32,
        report: &RepairReport,
    ) -> DomainResult<()> {
        let name = format!("{}-iteration-{iteration}-repairs.json", session.session_id);
        let value = serde_json::to_value(report)?;
        match self.sink.write_json(&name, &value).await {
            Ok(location) => info!(location = %location, "repair instructions saved"),
            Err(err) => warn!(name = %name, error = %err, "failed to save repair instructions"),
        }
        Ok(())
    }

    async fn persist_final_report(
        &self,
        session: &VerificationSession,
        report: &FinalReport,
    ) -> Option<String> {
        let name = format!("{}-FINAL-REPORT.json", session.session_id);
        let value = match serde_json::to_value(report) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "failed to serialize final report");
                return None;
            }
        };
        match self.sink.write_json(&name, &value).await {
            Ok(location) => {
                info!(location = %location, "final report saved");
                Some(location)
            }
            Err(err) => {
                error!(name = %name, error = %err, "failed to save final report");
                None
            }
        }
    }
}

/// Failure entries for the signals a cached entry reports missing.
fn cached_failures(
    entry: &KnownConfigurationEntry,
    estimates: &CachedLossEstimates,
) -> Vec<SignalFailure> {
    entry
        .ecommerce_journey
        .missing()
        .into_iter()
        .map(|signal| {
            let (title, loss) = match signal {
                EcommerceSignal::ViewItem => ("Product View Signal Missing", estimates.view_item),
                EcommerceSignal::AddToCart => ("Add to Cart Signal Missing", estimates.add_to_cart),
                EcommerceSignal::ViewCart => ("Cart View Signal Missing", estimates.view_cart),
                EcommerceSignal::BeginCheckout => {
                    ("Checkout Initiation Signal Missing", estimates.begin_checkout)
                }
                EcommerceSignal::Purchase => ("Purchase Signal Missing", estimates.purchase),
            };
            SignalFailure::revenue_signal(
                title,
                format!("{} event not firing", signal.event_name()),
                loss,
            )
            .for_signal(signal)
        })
        .collect()
}
