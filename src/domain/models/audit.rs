//! Audit result domain models.
//!
//! An [`AuditResult`] is produced fresh by every audit (live or synthesized
//! from a known configuration) and is never mutated or merged afterwards.
//! Field names serialize in camelCase; the JSON shape is the stable report
//! schema consumed by downstream tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::known_config::{KnownConfigurationEntry, TrackingSetup};

/// The five canonical e-commerce signals, in journey order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcommerceSignal {
    ViewItem,
    AddToCart,
    ViewCart,
    BeginCheckout,
    Purchase,
}

impl EcommerceSignal {
    /// All signals in the order the synthetic journey exercises them.
    pub const ALL: [Self; 5] = [
        Self::ViewItem,
        Self::AddToCart,
        Self::ViewCart,
        Self::BeginCheckout,
        Self::Purchase,
    ];

    /// The event name pushed onto the page's event queue.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ViewItem => "view_item",
            Self::AddToCart => "add_to_cart",
            Self::ViewCart => "view_cart",
            Self::BeginCheckout => "begin_checkout",
            Self::Purchase => "purchase",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.event_name() == name)
    }
}

impl std::fmt::Display for EcommerceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Which journey steps were observed firing their signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcommerceJourney {
    pub product_view: bool,
    pub add_to_cart: bool,
    pub view_cart: bool,
    pub begin_checkout: bool,
    pub purchase: bool,
}

impl EcommerceJourney {
    /// A journey where every signal fired.
    pub const fn complete() -> Self {
        Self {
            product_view: true,
            add_to_cart: true,
            view_cart: true,
            begin_checkout: true,
            purchase: true,
        }
    }

    pub fn get(&self, signal: EcommerceSignal) -> bool {
        match signal {
            EcommerceSignal::ViewItem => self.product_view,
            EcommerceSignal::AddToCart => self.add_to_cart,
            EcommerceSignal::ViewCart => self.view_cart,
            EcommerceSignal::BeginCheckout => self.begin_checkout,
            EcommerceSignal::Purchase => self.purchase,
        }
    }

    pub fn set(&mut self, signal: EcommerceSignal, fired: bool) {
        match signal {
            EcommerceSignal::ViewItem => self.product_view = fired,
            EcommerceSignal::AddToCart => self.add_to_cart = fired,
            EcommerceSignal::ViewCart => self.view_cart = fired,
            EcommerceSignal::BeginCheckout => self.begin_checkout = fired,
            EcommerceSignal::Purchase => self.purchase = fired,
        }
    }

    pub fn true_count(&self) -> usize {
        EcommerceSignal::ALL.iter().filter(|s| self.get(**s)).count()
    }

    /// Signals that did not fire, in journey order.
    pub fn missing(&self) -> Vec<EcommerceSignal> {
        EcommerceSignal::ALL
            .into_iter()
            .filter(|s| !self.get(*s))
            .collect()
    }

    /// Health score: `round(100 * fired / 5)`.
    pub fn signal_health(&self) -> u32 {
        let total = EcommerceSignal::ALL.len() as f64;
        let fired = self.true_count() as f64;
        // Always within 0..=100, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let health = ((fired / total) * 100.0).round() as u32;
        health
    }
}

/// Severity tier of a signal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Tier derived from the estimated monthly dollar impact.
    pub const fn from_monthly_loss(monthly_loss: u64) -> Self {
        if monthly_loss > 50_000 {
            Self::Critical
        } else if monthly_loss > 20_000 {
            Self::High
        } else {
            Self::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    RevenueSignalFailure,
    InfrastructureFailure,
    SystemFailure,
}

/// Infrastructure gaps the repair engine knows how to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureGap {
    /// Neither a tag manager nor gtag was detected.
    NoTracking,
    MissingTagManager,
    MissingAnalyticsProperty,
    /// A Universal Analytics (`UA-`) tag is still installed.
    LegacyAnalyticsTag,
}

/// A single detected failure in the tracking setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalFailure {
    pub severity: Severity,
    pub category: FailureCategory,
    pub title: String,
    pub description: String,
    pub monthly_loss: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<EcommerceSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<InfrastructureGap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_impact: Option<String>,
}

impl SignalFailure {
    /// A revenue-signal failure whose severity follows the dollar estimate.
    pub fn revenue_signal(
        title: impl Into<String>,
        description: impl Into<String>,
        monthly_loss: u64,
    ) -> Self {
        Self {
            severity: Severity::from_monthly_loss(monthly_loss),
            category: FailureCategory::RevenueSignalFailure,
            title: title.into(),
            description: description.into(),
            monthly_loss,
            algorithm_impact: Some(algorithm_impact(monthly_loss).to_string()),
            signal: None,
            infrastructure: None,
            revenue_impact: None,
        }
    }

    pub fn infrastructure(
        gap: InfrastructureGap,
        title: impl Into<String>,
        description: impl Into<String>,
        monthly_loss: u64,
    ) -> Self {
        Self {
            severity: Severity::from_monthly_loss(monthly_loss),
            category: FailureCategory::InfrastructureFailure,
            title: title.into(),
            description: description.into(),
            monthly_loss,
            algorithm_impact: Some(algorithm_impact(monthly_loss).to_string()),
            signal: None,
            infrastructure: Some(gap),
            revenue_impact: None,
        }
    }

    /// The single entry carried by a degraded audit.
    pub fn system_failure(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            category: FailureCategory::SystemFailure,
            title: "Audit Engine Error".to_string(),
            description: message.into(),
            monthly_loss: 0,
            algorithm_impact: None,
            signal: None,
            infrastructure: None,
            revenue_impact: Some("Unable to quantify - system failure".to_string()),
        }
    }

    #[must_use]
    pub fn for_signal(mut self, signal: EcommerceSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Qualitative label for how much a loss impairs ad-platform optimization.
pub const fn algorithm_impact(monthly_loss: u64) -> &'static str {
    if monthly_loss > 75_000 {
        "Severe - Algorithm effectively blind"
    } else if monthly_loss > 40_000 {
        "High - Significant optimization impairment"
    } else if monthly_loss > 15_000 {
        "Medium - Reduced algorithm efficiency"
    } else {
        "Low - Minor optimization impact"
    }
}

/// Platform a captured request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingPlatform {
    GoogleAnalytics,
    GoogleTagManager,
    GoogleAds,
    Meta,
    Tiktok,
    Snapchat,
    Pinterest,
    Unknown,
}

impl TrackingPlatform {
    pub fn categorize(url: &str) -> Self {
        if url.contains("google-analytics.com") {
            Self::GoogleAnalytics
        } else if url.contains("googletagmanager.com") {
            Self::GoogleTagManager
        } else if url.contains("google.com/ads") {
            Self::GoogleAds
        } else if url.contains("facebook.com") {
            Self::Meta
        } else if url.contains("tiktok.com") {
            Self::Tiktok
        } else if url.contains("snapchat.com") {
            Self::Snapchat
        } else if url.contains("pinterest.com") {
            Self::Pinterest
        } else {
            Self::Unknown
        }
    }

    pub const fn is_google(&self) -> bool {
        matches!(self, Self::GoogleAds | Self::GoogleAnalytics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Ga4Event,
    GtmLoad,
    FacebookPixel,
    PlatformSignal,
}

impl SignalType {
    pub fn extract(url: &str) -> Self {
        if url.contains("g/collect") {
            Self::Ga4Event
        } else if url.contains("gtm.js") {
            Self::GtmLoad
        } else if url.contains("facebook.com/tr") {
            Self::FacebookPixel
        } else {
            Self::PlatformSignal
        }
    }
}

/// A revenue-critical outgoing request observed during the journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCapture {
    pub url: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub platform: TrackingPlatform,
    pub signal_type: SignalType,
}

/// Client-supplied business figures used for dollar estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRevenueData {
    pub monthly_revenue: Option<f64>,
    pub monthly_ad_spend: Option<f64>,
    #[serde(default = "default_industry")]
    pub industry: String,
}

fn default_industry() -> String {
    "e-commerce".to_string()
}

impl Default for ClientRevenueData {
    fn default() -> Self {
        Self {
            monthly_revenue: None,
            monthly_ad_spend: None,
            industry: default_industry(),
        }
    }
}

impl ClientRevenueData {
    pub fn new(monthly_revenue: Option<f64>, monthly_ad_spend: Option<f64>) -> Self {
        Self {
            monthly_revenue,
            monthly_ad_spend,
            ..Self::default()
        }
    }

    /// Revenue, treating absent and zero the same way.
    pub fn revenue(&self) -> Option<f64> {
        self.monthly_revenue.filter(|r| *r > 0.0)
    }

    pub fn ad_spend(&self) -> f64 {
        self.monthly_ad_spend.unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("monthlyRevenue", self.monthly_revenue),
            ("monthlyAdSpend", self.monthly_ad_spend),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{name} must be a non-negative number, got {v}"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakageBreakdown {
    pub revenue_loss: u64,
    pub ad_spend_waste: u64,
    pub client_revenue: f64,
    pub client_ad_spend: f64,
}

/// Estimated dollar impact of missing signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueLeakage {
    pub monthly_loss: u64,
    pub annual_loss: u64,
    pub signal_loss_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_spend_waste: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<LeakageBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_discrepancy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RevenueLeakage {
    pub fn zero(signal_loss_percentage: f64, note: impl Into<String>) -> Self {
        Self {
            monthly_loss: 0,
            annual_loss: 0,
            signal_loss_percentage,
            ad_spend_waste: Some(0),
            breakdown: None,
            platform_discrepancy: None,
            note: Some(note.into()),
        }
    }
}

/// Derived health of the ad platforms fed by the captured requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPlatformImpact {
    #[serde(rename = "metaCAPIHealth")]
    pub meta_capi_health: u32,
    pub google_ads_health: u32,
    pub attribution_accuracy: f64,
}

/// Outcome of one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub timestamp: DateTime<Utc>,
    pub target_url: String,
    pub signal_health: u32,
    pub revenue_leakage: RevenueLeakage,
    pub signal_failures: Vec<SignalFailure>,
    pub ecommerce_journey: EcommerceJourney,
    pub network_capture: Vec<NetworkCapture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_platform_impact: Option<AdPlatformImpact>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<TrackingSetup>,
}

impl AuditResult {
    /// The result returned when the audit could not run at all.
    pub fn degraded(
        target_url: impl Into<String>,
        message: impl Into<String>,
        revenue_leakage: RevenueLeakage,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            target_url: target_url.into(),
            signal_health: 0,
            revenue_leakage,
            signal_failures: vec![SignalFailure::system_failure(message)],
            ecommerce_journey: EcommerceJourney::default(),
            network_capture: Vec::new(),
            ad_platform_impact: None,
            from_cache: false,
            setup: None,
        }
    }

    /// Synthesize a result from a known configuration.
    ///
    /// Health is recomputed from the cached journey; `revenue_leakage` is
    /// computed by the caller from the current client figures.
    pub fn from_known_configuration(
        target_url: impl Into<String>,
        entry: &KnownConfigurationEntry,
        revenue_leakage: RevenueLeakage,
        signal_failures: Vec<SignalFailure>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            target_url: target_url.into(),
            signal_health: entry.journey_health(),
            revenue_leakage,
            signal_failures,
            ecommerce_journey: entry.ecommerce_journey,
            network_capture: Vec::new(),
            ad_platform_impact: None,
            from_cache: true,
            setup: Some(entry.setup.clone()),
        }
    }

    pub fn critical_failures(&self) -> usize {
        self.signal_failures
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count()
    }

    pub fn is_system_failure(&self) -> bool {
        self.signal_failures
            .iter()
            .any(|f| f.category == FailureCategory::SystemFailure)
    }
}
