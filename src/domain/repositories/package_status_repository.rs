use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::Package;
use async_trait::async_trait;

/// Read-only queries about packages as the external tool sees them.
#[async_trait]
pub trait PackageStatusRepository: Send + Sync {
    /// Current status of `id`, or `None` when it could not be determined.
    /// A package that is simply not installed is a successful answer.
    async fn resolve(&self, id: &str, cancel: &CancellationToken) -> Option<Package>;

    /// Registry details, or `None` when the tool does not know the id.
    async fn details(&self, id: &str, cancel: &CancellationToken) -> Option<Package>;

    async fn is_tool_available(&self) -> bool;

    /// Copies a fresh resolution onto `package`. Returns `false` and leaves the
    /// package untouched when the status could not be determined.
    async fn refresh(&self, package: &mut Package, cancel: &CancellationToken) -> bool {
        match self.resolve(&package.id, cancel).await {
            Some(resolved) => {
                package.apply_status(&resolved);
                true
            }
            None => false,
        }
    }
}
