//! CLI command implementations.

pub mod audit;
pub mod config;
pub mod known_config;
pub mod repair;
pub mod verify;
