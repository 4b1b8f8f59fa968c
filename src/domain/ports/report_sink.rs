//! Report sink port - where JSON reports are persisted.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist `report` under `name`, returning where it was written.
    async fn write_json(&self, name: &str, report: &serde_json::Value) -> DomainResult<String>;
}
