//! Repair report domain models.

use serde::{Deserialize, Serialize};

use super::audit::{EcommerceSignal, InfrastructureGap};

/// Storefront platform the generated code targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairPlatform {
    #[default]
    Shopify,
    Woocommerce,
    Custom,
}

impl std::str::FromStr for RepairPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shopify" => Ok(Self::Shopify),
            "woocommerce" => Ok(Self::Woocommerce),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown platform '{other}' (shopify, woocommerce, custom)")),
        }
    }
}

/// Wrapping applied to generic (non-Liquid) snippets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Liquid,
    Html,
    Js,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "liquid" => Ok(Self::Liquid),
            "html" => Ok(Self::Html),
            "js" | "javascript" => Ok(Self::Js),
            other => Err(format!("unknown output format '{other}' (liquid, html, js)")),
        }
    }
}

/// Platform and wrapping for generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default)]
    pub platform: RepairPlatform,
    #[serde(default, alias = "outputFormat")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixCategory {
    TagManager,
    Analytics,
    Ecommerce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLanguage {
    Liquid,
    Html,
    Javascript,
    Json,
}

/// One generated code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub label: String,
    pub language: SnippetLanguage,
    pub code: String,
}

/// What a fix addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ref")]
pub enum IssueRef {
    Signal(EcommerceSignal),
    Infrastructure(InfrastructureGap),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairFix {
    pub issue_ref: IssueRef,
    pub category: FixCategory,
    pub issue: String,
    pub fix_description: String,
    pub generated_code: Vec<CodeSnippet>,
    pub install_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_condition: Option<String>,
    pub testing_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairBusinessValue {
    pub data_accuracy: u32,
    pub conversion_tracking: String,
    pub ad_optimization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    pub total_issues: usize,
    pub total_fixes: usize,
    pub estimated_hours: f64,
    pub estimated_time: String,
    pub business_value: RepairBusinessValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairFixes {
    pub tag_manager: Vec<RepairFix>,
    pub analytics: Vec<RepairFix>,
    pub ecommerce: Vec<RepairFix>,
}

impl RepairFixes {
    pub fn len(&self) -> usize {
        self.tag_manager.len() + self.analytics.len() + self.ecommerce.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepairFix> {
        self.tag_manager
            .iter()
            .chain(self.analytics.iter())
            .chain(self.ecommerce.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub file: String,
    pub changes: String,
}

/// One step of the ordered installation checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationStep {
    pub step: u32,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingPlan {
    pub pre_deployment: Vec<String>,
    pub post_deployment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub summary: RepairSummary,
    pub config: RepairConfig,
    pub fixes: RepairFixes,
    pub installation: Vec<InstallationStep>,
    pub testing: TestingPlan,
}

impl RepairReport {
    /// Signals addressed by the ecommerce fixes, in report order.
    pub fn fixed_signals(&self) -> Vec<EcommerceSignal> {
        self.fixes
            .ecommerce
            .iter()
            .filter_map(|f| match f.issue_ref {
                IssueRef::Signal(s) => Some(s),
                IssueRef::Infrastructure(_) => None,
            })
            .collect()
    }
}
