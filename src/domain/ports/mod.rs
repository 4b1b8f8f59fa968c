//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - BrowserDriver / BrowserSession: headless-browser automation
//! - ReportSink: JSON report persistence
//! - Clock: wall clock and sleeping
//! - FixDeployer: applying generated repairs
//!
//! These traits keep the audit engine and verification loop independent of
//! specific infrastructure implementations.

pub mod browser;
pub mod clock;
pub mod deployer;
pub mod report_sink;

pub use browser::{
    BrowserDriver, BrowserError, BrowserSession, ClickTarget, EventBridge, LaunchOptions,
    ObservedRequest, PageEvent, PageInspection, PushedEvent, WaitUntil,
};
pub use clock::Clock;
pub use deployer::FixDeployer;
pub use report_sink::ReportSink;
