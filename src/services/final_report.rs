//! Final report assembly for a finished verification session.

use chrono::{DateTime, Utc};

use crate::domain::models::{
    FinalReport, HealthPoint, LeakagePoint, PerformanceMetrics, ScoringConfig,
    SessionBusinessValue, SessionSummary, VerificationSession,
};

const ONGOING_MONITORING: &str = "Consider Shadow Monitoring service for ongoing maintenance";

/// Assemble the report. `session.revenue_recovered` must already be final.
pub fn build_final_report(
    session: &VerificationSession,
    end: DateTime<Utc>,
    scoring: &ScoringConfig,
) -> FinalReport {
    let final_health = session.final_health();

    FinalReport {
        session_summary: SessionSummary {
            session_id: session.session_id.clone(),
            target_url: session.target_url.clone(),
            total_iterations: session.iterations.len(),
            final_status: session.final_status,
            duration: format_duration(session.start_time, end),
            final_signal_health: final_health,
            revenue_recovered: session.revenue_recovered,
            total_issues_fixed: session.total_issues_fixed,
            error: session.error.clone(),
        },
        performance_metrics: performance_metrics(session),
        business_value: business_value(session, scoring),
        recommendations: recommendations(final_health),
        detailed_iterations: session.iterations.clone(),
    }
}

fn performance_metrics(session: &VerificationSession) -> PerformanceMetrics {
    let indexed = || session.iterations.iter().enumerate().map(|(i, it)| (i + 1, it));
    PerformanceMetrics {
        signal_health_progression: indexed()
            .map(|(iteration, it)| HealthPoint {
                iteration,
                health: it.health(),
                improvement: it.signal_improvement,
            })
            .collect(),
        revenue_impact_reduction: indexed()
            .map(|(iteration, it)| LeakagePoint {
                iteration,
                monthly_leakage: it.monthly_leakage(),
                annual_impact: it.monthly_leakage().saturating_mul(12),
            })
            .collect(),
    }
}

/// `None` when the last iteration produced no audit.
fn business_value(
    session: &VerificationSession,
    scoring: &ScoringConfig,
) -> Option<SessionBusinessValue> {
    session.last_iteration()?.audit_results.as_ref()?;

    let recovered = session.revenue_recovered;
    Some(SessionBusinessValue {
        monthly_revenue_recovered: recovered,
        annual_revenue_recovered: recovered.saturating_mul(12),
        ad_spend_optimization: round_to_u64(recovered as f64 * scoring.ad_spend_optimization_rate),
        algorithm_improvement: algorithm_improvement(recovered).to_string(),
        roi: roi(recovered, scoring.service_cost),
        time_to_payback: payback(recovered, scoring.service_cost),
    })
}

fn round_to_u64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // Non-negative and finite; saturates on overflow.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = value.round() as u64;
        rounded
    } else {
        0
    }
}

pub fn algorithm_improvement(recovered: u64) -> &'static str {
    if recovered > 50_000 {
        "Significant"
    } else if recovered > 20_000 {
        "Moderate"
    } else {
        "Minor"
    }
}

/// `round((12 * recovered - cost) / cost * 100)`, zero when nothing was recovered.
pub fn roi(recovered: u64, service_cost: f64) -> i64 {
    if recovered == 0 || service_cost <= 0.0 {
        return 0;
    }
    let annual = recovered as f64 * 12.0;
    #[allow(clippy::cast_possible_truncation)]
    let percent = (((annual - service_cost) / service_cost) * 100.0).round() as i64;
    percent
}

/// Whole months until the service cost is recovered.
pub fn payback(recovered: u64, service_cost: f64) -> String {
    if recovered == 0 {
        return "N/A".to_string();
    }
    let months = round_to_u64((service_cost / recovered as f64).ceil());
    if months == 1 {
        "1 month".to_string()
    } else {
        format!("{months} months")
    }
}

pub fn recommendations(final_health: u32) -> Vec<String> {
    let bucket: [&str; 3] = if final_health < 50 {
        [
            "CRITICAL: Fundamental tracking infrastructure requires rebuild",
            "Consider comprehensive audit of GTM and GA4 implementation",
            "Verify website platform permissions and access",
        ]
    } else if final_health < 80 {
        [
            "Continue optimization with additional repair iterations",
            "Manual review of complex issues may be required",
            "Consider server-side tracking implementation",
        ]
    } else if final_health < 100 {
        [
            "Fine-tune remaining signal gaps",
            "Monitor for edge cases and mobile-specific issues",
            "Implement ongoing monitoring for signal degradation",
        ]
    } else {
        [
            "Maintain current configuration with regular monitoring",
            "Set up alerts for signal degradation",
            "Schedule quarterly verification loops",
        ]
    };
    bucket
        .into_iter()
        .chain(std::iter::once(ONGOING_MONITORING))
        .map(str::to_string)
        .collect()
}

/// `"{minutes}m {seconds}s"`, floored.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let secs = (end - start).num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}
