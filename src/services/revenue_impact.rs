//! Revenue leakage and ad-platform impact heuristics.
//!
//! Shared by the live audit engine and the known-configuration fast path so
//! both produce identical dollar figures for the same health and client data.

use crate::domain::models::{
    AdPlatformImpact, ClientRevenueData, LeakageBreakdown, NetworkCapture, RevenueLeakage,
    ScoringConfig, TrackingPlatform,
};

/// Note attached when no revenue was supplied.
pub const NO_REVENUE_NOTE: &str = "Revenue data required for impact calculation";

/// `min(base + (100 - health), cap)`.
pub fn total_signal_loss(signal_health: u32, scoring: &ScoringConfig) -> f64 {
    let setup_loss = f64::from(100u32.saturating_sub(signal_health));
    (scoring.base_signal_loss + setup_loss).min(scoring.max_signal_loss)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_dollars(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// Estimate monthly/annual leakage for a health score.
///
/// Absent or zero revenue yields zero loss and an explanatory note rather
/// than a guessed figure.
pub fn estimate_leakage(
    signal_health: u32,
    client: &ClientRevenueData,
    scoring: &ScoringConfig,
) -> RevenueLeakage {
    let loss = total_signal_loss(signal_health, scoring);

    let Some(revenue) = client.revenue() else {
        tracing::debug!(signal_loss = loss, "no revenue data provided, impact calculation skipped");
        return RevenueLeakage::zero(loss, NO_REVENUE_NOTE);
    };

    let ad_spend = client.ad_spend();
    let revenue_loss = round_dollars(revenue * (loss / 100.0) * scoring.revenue_impact_rate);
    let ad_waste = round_dollars(ad_spend * (loss / 100.0) * scoring.ad_waste_rate);
    let monthly_loss = revenue_loss.saturating_add(ad_waste);

    tracing::debug!(
        monthly_loss,
        revenue_loss,
        ad_waste,
        signal_loss = loss,
        "revenue impact estimated"
    );

    RevenueLeakage {
        monthly_loss,
        annual_loss: monthly_loss.saturating_mul(12),
        signal_loss_percentage: loss,
        ad_spend_waste: None,
        breakdown: Some(LeakageBreakdown {
            revenue_loss,
            ad_spend_waste: ad_waste,
            client_revenue: revenue,
            client_ad_spend: ad_spend,
        }),
        platform_discrepancy: Some(format!(
            "{}-{}%",
            round_dollars(loss * 0.8),
            round_dollars(loss * 1.4)
        )),
        note: None,
    }
}

/// Derive ad-platform health from captured requests.
pub fn ad_platform_impact(signal_health: u32, captures: &[NetworkCapture]) -> AdPlatformImpact {
    let meta_seen = captures.iter().any(|c| c.platform == TrackingPlatform::Meta);
    let google_seen = captures.iter().any(|c| c.platform.is_google());
    let signal_loss = f64::from(100u32.saturating_sub(signal_health));

    AdPlatformImpact {
        meta_capi_health: if meta_seen { 75 } else { 25 },
        google_ads_health: if google_seen { signal_health } else { 30 },
        attribution_accuracy: (100.0 - signal_loss * 1.5).max(50.0),
    }
}
