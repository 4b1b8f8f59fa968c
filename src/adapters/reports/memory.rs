//! In-memory report sink for tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::ReportSink;

/// Keeps every written report, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportSink {
    reports: Arc<RwLock<Vec<(String, serde_json::Value)>>>,
    fail_writes: bool,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub async fn names(&self) -> Vec<String> {
        self.reports.read().await.iter().map(|(n, _)| n.clone()).collect()
    }

    pub async fn get(&self, name: &str) -> Option<serde_json::Value> {
        self.reports
            .read()
            .await
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn write_json(&self, name: &str, report: &serde_json::Value) -> DomainResult<String> {
        if self.fail_writes {
            return Err(DomainError::ReportPersistence(format!(
                "write of '{name}' rejected"
            )));
        }
        self.reports
            .write()
            .await
            .push((name.to_string(), report.clone()));
        Ok(format!("memory://{name}"))
    }
}
