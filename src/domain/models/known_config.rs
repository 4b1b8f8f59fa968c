//! Known-configuration domain models.
//!
//! A known configuration is a manually curated, pre-verified audit outcome
//! for a domain. It short-circuits the live audit while it is fresh.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::audit::{EcommerceJourney, RevenueLeakage};

/// Tracking containers and properties recorded for a verified domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSetup {
    #[serde(default)]
    pub web_container: Option<String>,
    #[serde(default)]
    pub server_container: Option<String>,
    #[serde(default)]
    pub ga4_property: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownConfigurationEntry {
    pub domain: String,
    pub last_verified: NaiveDate,
    pub signal_health: u32,
    #[serde(default)]
    pub setup: TrackingSetup,
    pub ecommerce_journey: EcommerceJourney,
    pub revenue_leakage: RevenueLeakage,
    #[serde(default)]
    pub status: String,
}

impl KnownConfigurationEntry {
    /// Health implied by the recorded journey.
    pub fn journey_health(&self) -> u32 {
        self.ecommerce_journey.signal_health()
    }

    /// Hours elapsed since the entry was verified (midnight UTC of `last_verified`).
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let verified_at = self.last_verified.and_time(chrono::NaiveTime::MIN).and_utc();
        let age: Duration = now - verified_at;
        age.num_milliseconds() as f64 / 3_600_000.0
    }
}
