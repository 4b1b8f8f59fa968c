//! Domain models for audits, repairs, verification sessions and configuration.

pub mod audit;
pub mod config;
pub mod known_config;
pub mod repair;
pub mod session;

pub use audit::{
    AdPlatformImpact, AuditResult, ClientRevenueData, EcommerceJourney, EcommerceSignal,
    FailureCategory, InfrastructureGap, LeakageBreakdown, NetworkCapture, RevenueLeakage,
    Severity, SignalFailure, SignalType, TrackingPlatform,
};
pub use config::{
    AuditConfig, CachedLossEstimates, Config, DeploymentConfig, DeploymentMode,
    KnownConfigurationsConfig, LoggingConfig, LossEstimates, ReportsConfig, ScoringConfig,
    VerificationConfig,
};
pub use known_config::{KnownConfigurationEntry, TrackingSetup};
pub use repair::{
    CodeSnippet, FileChange, FixCategory, InstallationStep, IssueRef, OutputFormat,
    RepairBusinessValue, RepairConfig, RepairFix, RepairFixes, RepairPlatform, RepairReport,
    RepairSummary, SnippetLanguage, TestingPlan,
};
pub use session::{
    DeploymentOutcome, DeploymentStatus, FinalReport, FinalStatus, HealthPoint, IterationRecord,
    LeakagePoint, PerformanceMetrics, SessionBusinessValue, SessionSummary, VerificationSession,
};
