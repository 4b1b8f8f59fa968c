//! Repair engine.
//!
//! Turns an [`AuditResult`] into a [`RepairReport`]: one fix per missing
//! journey signal and per infrastructure gap, an effort estimate, the
//! installation checklist and the testing plan. Output is templated text;
//! nothing is applied here.

use tracing::{debug, info, instrument};

use crate::domain::models::{
    AuditResult, EcommerceSignal, FileChange, FixCategory, InfrastructureGap, InstallationStep,
    IssueRef, RepairBusinessValue, RepairConfig, RepairFix, RepairFixes, RepairReport,
    RepairSummary, Severity, TestingPlan,
};
use crate::services::repair_templates::{self, Template};

const TAG_MANAGER_HOURS: f64 = 2.0;
const ANALYTICS_HOURS: f64 = 1.5;
const ECOMMERCE_HOURS: f64 = 1.0;

/// Generates repair reports for one platform and output format.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairEngine {
    config: RepairConfig,
}

impl RepairEngine {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RepairConfig {
        self.config
    }

    #[instrument(skip(self, audit), fields(url = %audit.target_url, health = audit.signal_health))]
    pub fn generate(&self, audit: &AuditResult) -> RepairReport {
        let fixes = RepairFixes {
            tag_manager: self.tag_manager_fixes(audit),
            analytics: self.analytics_fixes(audit),
            ecommerce: self.ecommerce_fixes(audit),
        };

        let estimated_hours = estimate_hours(&fixes);
        let summary = RepairSummary {
            total_issues: audit.signal_failures.len(),
            total_fixes: fixes.len(),
            estimated_hours,
            estimated_time: format!("{}-{} hours", estimated_hours, estimated_hours + 2.0),
            business_value: business_value(audit, &fixes),
        };

        info!(
            issues = summary.total_issues,
            fixes = summary.total_fixes,
            estimated_time = %summary.estimated_time,
            "generated repairs"
        );

        RepairReport {
            installation: installation_steps(&fixes),
            summary,
            config: self.config,
            fixes,
            testing: testing_plan(),
        }
    }

    fn tag_manager_fixes(&self, audit: &AuditResult) -> Vec<RepairFix> {
        let needed = has_gap(audit, InfrastructureGap::NoTracking)
            || has_gap(audit, InfrastructureGap::MissingTagManager);
        if !needed {
            return Vec::new();
        }
        debug!("generating tag manager fix");
        vec![fix(
            IssueRef::Infrastructure(InfrastructureGap::MissingTagManager),
            FixCategory::TagManager,
            "Missing GTM Container",
            "Install GTM container code",
            repair_templates::tag_manager_install(&self.config),
        )]
    }

    fn analytics_fixes(&self, audit: &AuditResult) -> Vec<RepairFix> {
        let mut fixes = Vec::new();
        if has_gap(audit, InfrastructureGap::NoTracking)
            || has_gap(audit, InfrastructureGap::MissingAnalyticsProperty)
        {
            debug!("generating analytics install fix");
            fixes.push(fix(
                IssueRef::Infrastructure(InfrastructureGap::MissingAnalyticsProperty),
                FixCategory::Analytics,
                "Missing GA4 Property",
                "Install GA4 tracking code",
                repair_templates::analytics_install(),
            ));
        }
        if has_gap(audit, InfrastructureGap::LegacyAnalyticsTag) {
            debug!("generating legacy analytics migration");
            fixes.push(fix(
                IssueRef::Infrastructure(InfrastructureGap::LegacyAnalyticsTag),
                FixCategory::Analytics,
                "Deprecated Universal Analytics",
                "Replace UA with GA4",
                repair_templates::legacy_migration(&self.config),
            ));
        }
        fixes
    }

    fn ecommerce_fixes(&self, audit: &AuditResult) -> Vec<RepairFix> {
        // A system failure leaves the journey empty without observing it.
        if audit.is_system_failure() {
            debug!("audit did not run; skipping ecommerce fixes");
            return Vec::new();
        }
        audit
            .ecommerce_journey
            .missing()
            .into_iter()
            .map(|signal| {
                fix(
                    IssueRef::Signal(signal),
                    FixCategory::Ecommerce,
                    &format!("Missing {} event", signal.event_name()),
                    ecommerce_fix_description(signal),
                    repair_templates::ecommerce_event(signal, &self.config),
                )
            })
            .collect()
    }
}

/// Convenience wrapper for one-off generation.
pub fn generate_repairs(audit: &AuditResult, config: &RepairConfig) -> RepairReport {
    RepairEngine::new(*config).generate(audit)
}

fn has_gap(audit: &AuditResult, gap: InfrastructureGap) -> bool {
    audit
        .signal_failures
        .iter()
        .any(|f| f.infrastructure == Some(gap))
}

fn fix(
    issue_ref: IssueRef,
    category: FixCategory,
    issue: &str,
    fix_description: &str,
    template: Template,
) -> RepairFix {
    RepairFix {
        issue_ref,
        category,
        issue: issue.to_string(),
        fix_description: fix_description.to_string(),
        generated_code: template.snippets,
        install_location: template.install_location,
        trigger_condition: template.trigger_condition,
        testing_steps: template.testing_steps,
    }
}

fn ecommerce_fix_description(signal: EcommerceSignal) -> &'static str {
    match signal {
        EcommerceSignal::ViewItem => "Add product view tracking",
        EcommerceSignal::AddToCart => "Add cart tracking",
        EcommerceSignal::ViewCart => "Add cart page tracking",
        EcommerceSignal::BeginCheckout => "Add checkout tracking",
        EcommerceSignal::Purchase => "Add purchase tracking",
    }
}

fn estimate_hours(fixes: &RepairFixes) -> f64 {
    fixes.tag_manager.len() as f64 * TAG_MANAGER_HOURS
        + fixes.analytics.len() as f64 * ANALYTICS_HOURS
        + fixes.ecommerce.len() as f64 * ECOMMERCE_HOURS
}

fn business_value(audit: &AuditResult, fixes: &RepairFixes) -> RepairBusinessValue {
    let count = |severity: Severity| {
        audit
            .signal_failures
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    };
    let critical = count(Severity::Critical);
    let high = count(Severity::High);
    let accuracy = (70 + critical * 15 + high * 10).min(95);

    RepairBusinessValue {
        data_accuracy: u32::try_from(accuracy).unwrap_or(95),
        conversion_tracking: if fixes.ecommerce.is_empty() {
            "Partial improvement".to_string()
        } else {
            "Full restoration".to_string()
        },
        ad_optimization: if critical > 0 {
            "Significant improvement".to_string()
        } else {
            "Moderate improvement".to_string()
        },
    }
}

fn file_changes(fixes: &[RepairFix], changes: impl Fn(&RepairFix) -> String) -> Vec<FileChange> {
    fixes
        .iter()
        .map(|f| FileChange {
            file: f.install_location.clone(),
            changes: changes(f),
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn installation_steps(fixes: &RepairFixes) -> Vec<InstallationStep> {
    vec![
        InstallationStep {
            step: 1,
            title: "Backup Your Current Setup".to_string(),
            description: "Download a copy of your current theme before making changes".to_string(),
            commands: strings(&["Download theme files", "Export current GTM container"]),
            files: Vec::new(),
        },
        InstallationStep {
            step: 2,
            title: "Install GTM Fixes".to_string(),
            description: "Apply Google Tag Manager configuration updates".to_string(),
            commands: Vec::new(),
            files: file_changes(&fixes.tag_manager, |_| "Add GTM container code".to_string()),
        },
        InstallationStep {
            step: 3,
            title: "Install GA4 Fixes".to_string(),
            description: "Apply Google Analytics 4 configuration updates".to_string(),
            commands: Vec::new(),
            files: file_changes(&fixes.analytics, |f| match f.issue_ref {
                IssueRef::Infrastructure(InfrastructureGap::LegacyAnalyticsTag) => {
                    "Replace Universal Analytics with GA4".to_string()
                }
                _ => "Add GA4 tracking code".to_string(),
            }),
        },
        InstallationStep {
            step: 4,
            title: "Install E-commerce Tracking".to_string(),
            description: "Add enhanced e-commerce event tracking".to_string(),
            commands: Vec::new(),
            files: file_changes(&fixes.ecommerce, |f| match f.issue_ref {
                IssueRef::Signal(signal) => format!("Add {} tracking", signal.event_name()),
                IssueRef::Infrastructure(_) => "Add e-commerce tracking".to_string(),
            }),
        },
        InstallationStep {
            step: 5,
            title: "Test Implementation".to_string(),
            description: "Verify all tracking is working correctly".to_string(),
            commands: strings(&[
                "Open GTM Preview mode",
                "Open GA4 DebugView",
                "Navigate through site",
                "Verify events are firing",
                "Check Real-time reports",
            ]),
            files: Vec::new(),
        },
        InstallationStep {
            step: 6,
            title: "Go Live".to_string(),
            description: "Publish changes to production".to_string(),
            commands: strings(&[
                "Publish GTM container",
                "Deploy theme changes",
                "Monitor for 24 hours",
                "Verify data in GA4 reports",
            ]),
            files: Vec::new(),
        },
    ]
}

fn testing_plan() -> TestingPlan {
    TestingPlan {
        pre_deployment: strings(&[
            "GTM Preview mode verification",
            "GA4 DebugView testing",
            "Cross-browser testing",
            "Mobile device testing",
        ]),
        post_deployment: strings(&[
            "Real-time report monitoring",
            "Event tracking verification",
            "Conversion tracking validation",
            "24-hour data validation",
        ]),
    }
}
