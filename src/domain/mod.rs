//! Domain layer for the signal verification system
//!
//! This module contains core business models, errors and the port traits
//! that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{validate_target_url, DomainError, DomainResult};
