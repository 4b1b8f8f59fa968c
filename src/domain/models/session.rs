//! Verification session domain models.
//!
//! A [`VerificationSession`] is created when the loop starts, grows by one
//! [`IterationRecord`] per pass and is finalized exactly once with a
//! [`FinalStatus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audit::{AuditResult, ClientRevenueData};
use super::repair::RepairReport;

/// Terminal state of a verification session. Exactly one is set on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    /// Health reached the target.
    Success,
    /// Health reached the minimum passing threshold but not the target.
    Acceptable,
    /// The iteration cap was hit before either threshold.
    MaxIterationsReached,
    /// An error escaped the loop (including cancellation and timeout).
    Error,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Acceptable => "ACCEPTABLE",
            Self::MaxIterationsReached => "MAX_ITERATIONS_REACHED",
            Self::Error => "ERROR",
        }
    }

    /// Whether a CLI wrapper should exit zero.
    pub const fn is_passing(&self) -> bool {
        matches!(self, Self::Success | Self::Acceptable)
    }
}

impl std::fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentOutcome {
    Success,
    Failed,
    /// Fixes were handed off for manual deployment.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub status: DeploymentOutcome,
    pub tag_manager_deployment: bool,
    pub theme_deployment: bool,
    pub timestamp: DateTime<Utc>,
    pub simulated_deployment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One pass of the verification loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    pub number: u32,
    pub timestamp: DateTime<Utc>,
    pub audit_results: Option<AuditResult>,
    pub repair_results: Option<RepairReport>,
    pub deployment_status: Option<DeploymentStatus>,
    pub signal_improvement: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IterationRecord {
    pub fn new(number: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            number,
            timestamp,
            audit_results: None,
            repair_results: None,
            deployment_status: None,
            signal_improvement: 0,
            error: None,
        }
    }

    /// Measured health, zero when the iteration produced no audit.
    pub fn health(&self) -> u32 {
        self.audit_results.as_ref().map_or(0, |a| a.signal_health)
    }

    /// Monthly leakage, zero when the iteration produced no audit.
    pub fn monthly_leakage(&self) -> u64 {
        self.audit_results
            .as_ref()
            .map_or(0, |a| a.revenue_leakage.monthly_loss)
    }

    pub fn fixes_generated(&self) -> usize {
        self.repair_results
            .as_ref()
            .map_or(0, |r| r.summary.total_fixes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub target_url: String,
    pub client_data: ClientRevenueData,
    pub iterations: Vec<IterationRecord>,
    pub final_status: Option<FinalStatus>,
    pub revenue_recovered: u64,
    pub total_issues_fixed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationSession {
    pub fn new(
        target_url: impl Into<String>,
        client_data: ClientRevenueData,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: generate_session_id(start_time),
            start_time,
            target_url: target_url.into(),
            client_data,
            iterations: Vec::new(),
            final_status: None,
            revenue_recovered: 0,
            total_issues_fixed: 0,
            error: None,
        }
    }

    pub fn last_iteration(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }

    pub fn final_health(&self) -> u32 {
        self.last_iteration().map_or(0, IterationRecord::health)
    }

    /// `max(0, first iteration leakage - last iteration leakage)`.
    pub fn compute_revenue_recovered(&self) -> u64 {
        let initial = self.iterations.first().map_or(0, IterationRecord::monthly_leakage);
        let last = self.last_iteration().map_or(0, IterationRecord::monthly_leakage);
        initial.saturating_sub(last)
    }
}

/// `VL-<millis>-<5 uppercase alphanumerics>`.
fn generate_session_id(start_time: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_uppercase();
    format!("VL-{}-{}", start_time.timestamp_millis(), suffix)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub target_url: String,
    pub total_iterations: usize,
    pub final_status: Option<FinalStatus>,
    pub duration: String,
    pub final_signal_health: u32,
    pub revenue_recovered: u64,
    pub total_issues_fixed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPoint {
    pub iteration: usize,
    pub health: u32,
    pub improvement: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakagePoint {
    pub iteration: usize,
    pub monthly_leakage: u64,
    pub annual_impact: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub signal_health_progression: Vec<HealthPoint>,
    pub revenue_impact_reduction: Vec<LeakagePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBusinessValue {
    pub monthly_revenue_recovered: u64,
    pub annual_revenue_recovered: u64,
    pub ad_spend_optimization: u64,
    pub algorithm_improvement: String,
    pub roi: i64,
    pub time_to_payback: String,
}

/// The report persisted once at session end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub session_summary: SessionSummary,
    pub performance_metrics: PerformanceMetrics,
    pub business_value: Option<SessionBusinessValue>,
    pub recommendations: Vec<String>,
    pub detailed_iterations: Vec<IterationRecord>,
}
