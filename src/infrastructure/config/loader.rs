use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "SIGNAL_LAB_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be between 1 and 100")]
    InvalidMaxIterations(u32),

    #[error(
        "Invalid health thresholds: minimum_passing_health ({minimum}) must not exceed target_signal_health ({target}), and target must be at most 100"
    )]
    InvalidThresholds { minimum: u32, target: u32 },

    #[error("Invalid session_timeout_secs: {0}. Must be at least 1")]
    InvalidSessionTimeout(u64),

    #[error("Invalid {name}: {value}. Must be at least 1")]
    InvalidTimeout { name: &'static str, value: u64 },

    #[error("Invalid signal loss: base_signal_loss ({base}) must be between 0 and max_signal_loss ({max}), and max at most 100")]
    InvalidSignalLoss { base: f64, max: f64 },

    #[error("Invalid {name}: {value}. Must be between 0 and 1")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Invalid service_cost: {0}. Must be positive")]
    InvalidServiceCost(f64),

    #[error("Invalid max_age_hours: {0}. Must be positive")]
    InvalidMaxAge(f64),

    #[error("Reports directory cannot be empty")]
    EmptyReportsDirectory,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .signal-lab/config.yaml (project config)
    /// 3. .signal-lab/local.yaml (project local overrides, optional)
    /// 4. Environment variables (SIGNAL_LAB_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".signal-lab/config.yaml"))
            .merge(Yaml::file(".signal-lab/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let verification = &config.verification;
        if verification.max_iterations == 0 || verification.max_iterations > 100 {
            return Err(ConfigError::InvalidMaxIterations(verification.max_iterations));
        }
        if verification.target_signal_health > 100
            || verification.minimum_passing_health > verification.target_signal_health
        {
            return Err(ConfigError::InvalidThresholds {
                minimum: verification.minimum_passing_health,
                target: verification.target_signal_health,
            });
        }
        if verification.session_timeout_secs == 0 {
            return Err(ConfigError::InvalidSessionTimeout(
                verification.session_timeout_secs,
            ));
        }

        for (name, value) in [
            ("navigation_timeout_ms", config.audit.navigation_timeout_ms),
            ("stage_timeout_ms", config.audit.stage_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidTimeout { name, value });
            }
        }

        let scoring = &config.scoring;
        if !(0.0..=scoring.max_signal_loss).contains(&scoring.base_signal_loss)
            || scoring.max_signal_loss > 100.0
        {
            return Err(ConfigError::InvalidSignalLoss {
                base: scoring.base_signal_loss,
                max: scoring.max_signal_loss,
            });
        }
        for (name, value) in [
            ("revenue_impact_rate", scoring.revenue_impact_rate),
            ("ad_waste_rate", scoring.ad_waste_rate),
            ("ad_spend_optimization_rate", scoring.ad_spend_optimization_rate),
            ("deployment.success_rate", config.deployment.success_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        if scoring.service_cost.is_nan() || scoring.service_cost <= 0.0 {
            return Err(ConfigError::InvalidServiceCost(scoring.service_cost));
        }

        if config.known_configurations.max_age_hours.is_nan()
            || config.known_configurations.max_age_hours <= 0.0
        {
            return Err(ConfigError::InvalidMaxAge(
                config.known_configurations.max_age_hours,
            ));
        }
        if let Some(path) = &config.known_configurations.path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "known_configurations.path cannot be empty when set".to_string(),
                ));
            }
        }

        if config.reports.directory.trim().is_empty() {
            return Err(ConfigError::EmptyReportsDirectory);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DeploymentMode, OutputFormat, RepairPlatform};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.verification.max_iterations, 5);
        assert_eq!(config.verification.target_signal_health, 100);
        assert_eq!(config.verification.minimum_passing_health, 80);
        assert_eq!(config.verification.iteration_delay_ms, 5000);
        assert!((config.scoring.service_cost - 2950.0).abs() < f64::EPSILON);
        assert!((config.deployment.success_rate - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.reports.directory, ".signal-lab/reports");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
verification:
  max_iterations: 3
  minimum_passing_health: 60
scoring:
  service_cost: 4000
  loss_estimates:
    purchase: 90000
repair:
  platform: woocommerce
  output_format: js
deployment:
  mode: report_only
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.verification.max_iterations, 3);
        assert_eq!(config.verification.minimum_passing_health, 60);
        assert_eq!(config.verification.target_signal_health, 100);
        assert!((config.scoring.service_cost - 4000.0).abs() < f64::EPSILON);
        assert_eq!(config.scoring.loss_estimates.purchase, 90_000);
        assert_eq!(config.scoring.loss_estimates.begin_checkout, 30_000);
        assert_eq!(config.repair.platform, RepairPlatform::Woocommerce);
        assert_eq!(config.repair.output_format, OutputFormat::Js);
        assert_eq!(config.deployment.mode, DeploymentMode::ReportOnly);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_iterations() {
        let mut config = Config::default();
        config.verification.max_iterations = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(0))
        ));
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = Config::default();
        config.verification.minimum_passing_health = 90;
        config.verification.target_signal_health = 85;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThresholds {
                minimum: 90,
                target: 85
            })
        ));

        config.verification.minimum_passing_health = 80;
        config.verification.target_signal_health = 120;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_validate_rates() {
        let mut config = Config::default();
        config.deployment.success_rate = 1.5;
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidRate { name, .. }) => {
                assert_eq!(name, "deployment.success_rate");
            }
            other => panic!("Expected InvalidRate error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_signal_loss() {
        let mut config = Config::default();
        config.scoring.base_signal_loss = 60.0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSignalLoss { .. })
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            _ => panic!("Expected InvalidLogLevel error"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogFormat(format)) => assert_eq!(format, "xml"),
            _ => panic!("Expected InvalidLogFormat error"),
        }
    }

    #[test]
    fn test_validate_empty_reports_directory() {
        let mut config = Config::default();
        config.reports.directory = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyReportsDirectory)
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ConfigLoader::load_from_file("/nonexistent/signal-lab.yaml").unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_env_override() {
        let file = yaml_file("verification:\n  max_iterations: 4\nlogging:\n  level: warn\n");

        let config = temp_env::with_vars(
            [
                ("SIGNAL_LAB_VERIFICATION__MAX_ITERATIONS", Some("2")),
                ("SIGNAL_LAB_KNOWN_CONFIGURATIONS__MAX_AGE_HOURS", Some("48")),
            ],
            || ConfigLoader::load_from_file(file.path()),
        )
        .expect("config should load");

        assert_eq!(config.verification.max_iterations, 2, "env should win");
        assert!((config.known_configurations.max_age_hours - 48.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "warn", "file value should persist");
    }

    #[test]
    fn test_hierarchical_merging() {
        let base_file = yaml_file(
            "verification:\n  max_iterations: 5\nlogging:\n  level: info\n  format: json\n",
        );
        let override_file = yaml_file("verification:\n  max_iterations: 2\nlogging:\n  level: debug\n");

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.verification.max_iterations, 2, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let file = yaml_file("logging:\n  rotation: weekly\n");
        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid log rotation"));
    }
}
