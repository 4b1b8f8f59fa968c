//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides (`SIGNAL_LAB_` prefix, `__` nesting)
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
