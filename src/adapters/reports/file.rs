//! Filesystem report sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::ReportSink;

/// Writes pretty-printed JSON reports into a directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    directory: PathBuf,
}

impl FileReportSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Report names become file names; path separators are not allowed.
fn file_name(name: &str) -> DomainResult<String> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(DomainError::ReportPersistence(format!(
            "invalid report name '{name}'"
        )));
    }
    if Path::new(name).extension().is_some_and(|ext| ext == "json") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.json"))
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn write_json(&self, name: &str, report: &serde_json::Value) -> DomainResult<String> {
        let path = self.directory.join(file_name(name)?);
        let body = serde_json::to_vec_pretty(report)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| {
                DomainError::ReportPersistence(format!(
                    "failed to create {}: {e}",
                    self.directory.display()
                ))
            })?;
        tokio::fs::write(&path, body).await.map_err(|e| {
            DomainError::ReportPersistence(format!("failed to write {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "report written");
        Ok(path.display().to_string())
    }
}
