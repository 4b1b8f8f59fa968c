//! Adapters implementing the domain ports.

pub mod browser;
pub mod clock;
pub mod reports;

pub use browser::{DriverKind, HttpBrowserDriver, ScriptedBrowserDriver};
pub use clock::{FixedClock, SystemClock};
pub use reports::{FileReportSink, MemoryReportSink};
