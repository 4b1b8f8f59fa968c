//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON console output on stderr
//! - JSON file output with rotation via tracing-appender

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
