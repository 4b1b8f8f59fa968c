use serde::{Deserialize, Serialize};

use super::repair::RepairConfig;

/// Main configuration structure for Signal Lab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Verification loop thresholds and pacing
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Audit engine timeouts and tracking allow-list
    #[serde(default)]
    pub audit: AuditConfig,

    /// Revenue and cost heuristics
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Repair generation target
    #[serde(default)]
    pub repair: RepairConfig,

    /// Fix deployment behaviour
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Report persistence
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Known-configuration cache
    #[serde(default)]
    pub known_configurations: KnownConfigurationsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Verification loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerificationConfig {
    /// Iteration cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Health at which the loop stops with SUCCESS
    #[serde(default = "default_target_signal_health")]
    pub target_signal_health: u32,

    /// Health at which the loop stops with ACCEPTABLE
    #[serde(default = "default_minimum_passing_health")]
    pub minimum_passing_health: u32,

    /// Delay between iterations in milliseconds
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,

    /// Wall-clock limit for a whole session in seconds
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

const fn default_max_iterations() -> u32 {
    5
}

const fn default_target_signal_health() -> u32 {
    100
}

const fn default_minimum_passing_health() -> u32 {
    80
}

const fn default_iteration_delay_ms() -> u64 {
    5000
}

const fn default_session_timeout_secs() -> u64 {
    900
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            target_signal_health: default_target_signal_health(),
            minimum_passing_health: default_minimum_passing_health(),
            iteration_delay_ms: default_iteration_delay_ms(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

/// Audit engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditConfig {
    /// Homepage navigation timeout in milliseconds
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Timeout for cart/checkout navigations and clicks in milliseconds
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,

    /// Settle time after the homepage loads
    #[serde(default = "default_homepage_settle_ms")]
    pub homepage_settle_ms: u64,

    /// Settle time after other journey steps
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// User agent presented by HTTP-based drivers
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra container/property IDs whose requests are captured
    #[serde(default)]
    pub tracked_ids: Vec<String>,
}

const fn default_navigation_timeout_ms() -> u64 {
    30_000
}

const fn default_stage_timeout_ms() -> u64 {
    10_000
}

const fn default_homepage_settle_ms() -> u64 {
    3000
}

const fn default_settle_ms() -> u64 {
    2000
}

const fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("signal-lab/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            stage_timeout_ms: default_stage_timeout_ms(),
            homepage_settle_ms: default_homepage_settle_ms(),
            settle_ms: default_settle_ms(),
            headless: true,
            user_agent: default_user_agent(),
            tracked_ids: Vec::new(),
        }
    }
}

/// Revenue heuristics. Provisional business tuning, kept overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Signal loss attributed to browser restrictions alone (percent)
    #[serde(default = "default_base_signal_loss")]
    pub base_signal_loss: f64,

    /// Cap on total signal loss (percent)
    #[serde(default = "default_max_signal_loss")]
    pub max_signal_loss: f64,

    /// Share of lost signal that turns into lost revenue
    #[serde(default = "default_revenue_impact_rate")]
    pub revenue_impact_rate: f64,

    /// Share of lost signal that turns into wasted ad spend
    #[serde(default = "default_ad_waste_rate")]
    pub ad_waste_rate: f64,

    /// Price of the restoration service used for ROI and payback
    #[serde(default = "default_service_cost")]
    pub service_cost: f64,

    /// Share of recovered revenue credited to ad efficiency
    #[serde(default = "default_ad_spend_optimization_rate")]
    pub ad_spend_optimization_rate: f64,

    /// Per-issue monthly loss estimates
    #[serde(default)]
    pub loss_estimates: LossEstimates,
}

const fn default_base_signal_loss() -> f64 {
    15.0
}

const fn default_max_signal_loss() -> f64 {
    50.0
}

const fn default_revenue_impact_rate() -> f64 {
    0.08
}

const fn default_ad_waste_rate() -> f64 {
    0.15
}

const fn default_service_cost() -> f64 {
    2950.0
}

const fn default_ad_spend_optimization_rate() -> f64 {
    0.3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_signal_loss: default_base_signal_loss(),
            max_signal_loss: default_max_signal_loss(),
            revenue_impact_rate: default_revenue_impact_rate(),
            ad_waste_rate: default_ad_waste_rate(),
            service_cost: default_service_cost(),
            ad_spend_optimization_rate: default_ad_spend_optimization_rate(),
            loss_estimates: LossEstimates::default(),
        }
    }
}

/// Estimated monthly dollar impact per detected issue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct LossEstimates {
    pub tracking_missing: u64,
    pub legacy_analytics: u64,
    pub missing_tag_manager: u64,
    pub missing_analytics_property: u64,
    pub add_to_cart_control_missing: u64,
    pub product_discovery: u64,
    pub product_pages_inaccessible: u64,
    pub view_item: u64,
    pub add_to_cart: u64,
    pub view_cart: u64,
    pub begin_checkout: u64,
    pub purchase: u64,
    /// Used when synthesizing failures for cached results
    pub cached: CachedLossEstimates,
}

impl Default for LossEstimates {
    fn default() -> Self {
        Self {
            tracking_missing: 200_000,
            legacy_analytics: 25_000,
            missing_tag_manager: 15_000,
            missing_analytics_property: 15_000,
            add_to_cart_control_missing: 20_000,
            product_discovery: 50_000,
            product_pages_inaccessible: 25_000,
            view_item: 15_000,
            add_to_cart: 20_000,
            view_cart: 18_000,
            begin_checkout: 30_000,
            purchase: 100_000,
            cached: CachedLossEstimates::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CachedLossEstimates {
    pub view_item: u64,
    pub add_to_cart: u64,
    pub view_cart: u64,
    pub begin_checkout: u64,
    pub purchase: u64,
}

impl Default for CachedLossEstimates {
    fn default() -> Self {
        Self {
            view_item: 600,
            add_to_cart: 800,
            view_cart: 700,
            begin_checkout: 1200,
            purchase: 2000,
        }
    }
}

/// How generated fixes are deployed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Random outcome, no real side effect
    #[default]
    Simulated,
    /// Never deploys; reports are left for manual or CI deployment
    ReportOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeploymentConfig {
    #[serde(default)]
    pub mode: DeploymentMode,

    /// Probability that a simulated deployment succeeds
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,

    /// Time a simulated deployment takes in milliseconds
    #[serde(default = "default_simulated_duration_ms")]
    pub simulated_duration_ms: u64,
}

const fn default_success_rate() -> f64 {
    0.9
}

const fn default_simulated_duration_ms() -> u64 {
    2000
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::default(),
            success_rate: default_success_rate(),
            simulated_duration_ms: default_simulated_duration_ms(),
        }
    }
}

/// Report persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportsConfig {
    /// Directory receiving JSON reports
    #[serde(default = "default_reports_directory")]
    pub directory: String,
}

fn default_reports_directory() -> String {
    ".signal-lab/reports".to_string()
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_reports_directory(),
        }
    }
}

/// Known-configuration cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KnownConfigurationsConfig {
    /// YAML file with curated entries (replaces the built-in seed when set)
    #[serde(default)]
    pub path: Option<String>,

    /// Entries older than this are ignored
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: f64,
}

const fn default_max_age_hours() -> f64 {
    24.0
}

impl Default for KnownConfigurationsConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_age_hours: default_max_age_hours(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
