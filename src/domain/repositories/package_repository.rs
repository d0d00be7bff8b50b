use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::ActionError;
use async_trait::async_trait;

/// Mutating operations the queue delegates to the external tool.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn install_package(&self, id: &str, cancel: &CancellationToken)
    -> Result<(), ActionError>;
    async fn uninstall_package(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError>;
    async fn upgrade_package(&self, id: &str, cancel: &CancellationToken)
    -> Result<(), ActionError>;
}
