//! Known-configuration store.
//!
//! Curated, pre-verified audit outcomes keyed by hostname. The store is
//! injected into the verification loop so it can be swapped for a YAML file
//! or a test fixture. Lookups are pure; the store is read-only once built.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::models::{
    EcommerceJourney, KnownConfigurationEntry, RevenueLeakage, TrackingSetup,
};

/// Read-only table of known configurations.
#[derive(Debug, Clone, Default)]
pub struct KnownConfigurationStore {
    entries: HashMap<String, KnownConfigurationEntry>,
}

#[derive(Debug, Deserialize)]
struct KnownConfigurationFile {
    #[serde(default)]
    entries: Vec<KnownConfigurationEntry>,
}

/// Lowercased hostname with a leading `www.` removed.
pub fn normalize_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    host.strip_prefix("www.").map_or_else(|| host.clone(), str::to_string)
}

impl KnownConfigurationStore {
    pub fn new(entries: impl IntoIterator<Item = KnownConfigurationEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (normalize_domain(&entry.domain), entry))
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load entries from a YAML file with a top-level `entries` list.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read known configurations from {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("Failed to parse known configurations in {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: KnownConfigurationFile = serde_yaml::from_str(raw)?;
        for entry in &file.entries {
            let expected = entry.journey_health();
            if entry.signal_health != expected {
                bail!(
                    "Known configuration for {} records signalHealth {} but its journey implies {}",
                    entry.domain,
                    entry.signal_health,
                    expected
                );
            }
        }
        Ok(Self::new(file.entries))
    }

    /// The seed table of domains verified by hand.
    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by domain.
    pub fn entries(&self) -> Vec<&KnownConfigurationEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.domain.cmp(&b.domain));
        entries
    }

    /// Find the entry for the URL's hostname. Unparsable URLs yield `None`.
    pub fn lookup(&self, url: &str) -> Option<&KnownConfigurationEntry> {
        let parsed = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(url, error = %e, "cannot parse URL for known-configuration lookup");
                return None;
            }
        };
        let domain = normalize_domain(parsed.host_str()?);
        let entry = self.entries.get(&domain);
        tracing::debug!(domain = %domain, found = entry.is_some(), "known-configuration lookup");
        entry
    }
}

/// Whether the entry was verified less than `max_age_hours` before `now`.
pub fn is_fresh(entry: &KnownConfigurationEntry, now: DateTime<Utc>, max_age_hours: f64) -> bool {
    let age = entry.age_hours(now);
    tracing::debug!(
        domain = %entry.domain,
        age_hours = format!("{age:.1}"),
        max_age_hours,
        "known-configuration age"
    );
    age < max_age_hours
}

fn builtin_entries() -> Vec<KnownConfigurationEntry> {
    let verified = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap_or_default();
    vec![
        KnownConfigurationEntry {
            domain: "lwscientific.com".to_string(),
            last_verified: verified,
            signal_health: 100,
            setup: TrackingSetup {
                web_container: Some("GTM-KMKS7RMC".to_string()),
                server_container: Some("GTM-5VT8N6KP".to_string()),
                ga4_property: Some("382698683".to_string()),
                issues: Vec::new(),
            },
            ecommerce_journey: EcommerceJourney::complete(),
            revenue_leakage: RevenueLeakage {
                monthly_loss: 0,
                annual_loss: 0,
                signal_loss_percentage: 0.0,
                ad_spend_waste: None,
                breakdown: None,
                platform_discrepancy: None,
                note: None,
            },
            status: "VERIFIED_100_PERCENT".to_string(),
        },
        KnownConfigurationEntry {
            domain: "store.labessentials.com".to_string(),
            last_verified: verified,
            signal_health: 60,
            setup: TrackingSetup {
                web_container: Some("GTM-WNG6Z9ZD".to_string()),
                server_container: None,
                ga4_property: Some("394300830".to_string()),
                issues: vec![
                    "Missing add_to_cart event".to_string(),
                    "Missing begin_checkout event".to_string(),
                ],
            },
            ecommerce_journey: EcommerceJourney {
                product_view: true,
                add_to_cart: false,
                view_cart: true,
                begin_checkout: false,
                purchase: true,
            },
            revenue_leakage: RevenueLeakage {
                monthly_loss: 0,
                annual_loss: 0,
                signal_loss_percentage: 30.0,
                ad_spend_waste: None,
                breakdown: None,
                platform_discrepancy: None,
                note: Some(
                    "Low-revenue store - tracking issues exist but minimal financial impact"
                        .to_string(),
                ),
            },
            status: "TRACKING_ISSUES_LOW_IMPACT".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(domain: &str, verified: NaiveDate) -> KnownConfigurationEntry {
        let mut e = builtin_entries().remove(0);
        e.domain = domain.to_string();
        e.last_verified = verified;
        e
    }

    #[test]
    fn test_lookup_normalizes_host() {
        let store = KnownConfigurationStore::builtin();
        assert!(store.lookup("https://www.lwscientific.com/collections/all").is_some());
        assert!(store.lookup("https://LWSCIENTIFIC.com").is_some());
        assert!(store.lookup("https://store.labessentials.com").is_some());
        assert!(store.lookup("https://unknown.example.com").is_none());
    }

    #[test]
    fn test_lookup_invalid_url_is_none() {
        let store = KnownConfigurationStore::builtin();
        assert!(store.lookup("not a url").is_none());
    }

    #[test]
    fn test_freshness_window() {
        let verified = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let e = entry("fresh.example.com", verified);

        let within = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        assert!(is_fresh(&e, within, 24.0));

        let boundary = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert!(!is_fresh(&e, boundary, 24.0));

        let stale = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        assert!(!is_fresh(&e, stale, 24.0));
        assert!(is_fresh(&e, stale, 24.0 * 7.0));
    }

    #[test]
    fn test_builtin_entries_keep_health_consistent_with_journey() {
        for e in KnownConfigurationStore::builtin().entries() {
            assert_eq!(e.signal_health, e.ecommerce_journey.signal_health(), "{}", e.domain);
        }
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
entries:
  - domain: www.shop.example.com
    lastVerified: 2026-10-18
    signalHealth: 80
    setup:
      webContainer: GTM-TEST123
    ecommerceJourney:
      productView: true
      addToCart: true
      viewCart: true
      beginCheckout: false
      purchase: true
    revenueLeakage:
      monthlyLoss: 0
      annualLoss: 0
      signalLossPercentage: 35
    status: PARTIAL
";
        let store = KnownConfigurationStore::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(store.len(), 1);
        let found = store.lookup("https://shop.example.com/cart").expect("entry");
        assert_eq!(found.signal_health, 80);
        assert_eq!(found.setup.web_container.as_deref(), Some("GTM-TEST123"));
    }

    #[test]
    fn test_from_yaml_rejects_health_inconsistent_with_journey() {
        let yaml = r"
entries:
  - domain: mismatch.example.com
    lastVerified: 2026-10-18
    signalHealth: 70
    ecommerceJourney:
      productView: true
      addToCart: false
      viewCart: true
      beginCheckout: false
      purchase: true
    revenueLeakage:
      monthlyLoss: 0
      annualLoss: 0
      signalLossPercentage: 30
";
        let err = KnownConfigurationStore::from_yaml_str(yaml).expect_err("mismatched health");
        let message = err.to_string();
        assert!(message.contains("mismatch.example.com"), "{message}");
        assert!(message.contains("implies 60"), "{message}");
    }
}
