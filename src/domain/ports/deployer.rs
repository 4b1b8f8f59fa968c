//! Fix deployer port - applies a repair report to the target site.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{DeploymentStatus, RepairReport};

#[async_trait]
pub trait FixDeployer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deploy(&self, report: &RepairReport) -> DomainResult<DeploymentStatus>;
}
