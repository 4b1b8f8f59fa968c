//! Application services: auditing, repair generation, deployment and the
//! verification loop that ties them together.

pub mod audit_engine;
pub mod deployment;
pub mod final_report;
pub mod known_configurations;
pub mod repair_engine;
pub mod repair_templates;
pub mod revenue_impact;
pub mod verification_loop;

pub use audit_engine::{AuditError, SignalAuditEngine};
pub use deployment::{ReportOnlyDeployer, SimulatedDeployer};
pub use final_report::build_final_report;
pub use known_configurations::{is_fresh, KnownConfigurationStore};
pub use repair_engine::{generate_repairs, RepairEngine};
pub use verification_loop::{VerificationLoopOrchestrator, VerificationOutcome};
