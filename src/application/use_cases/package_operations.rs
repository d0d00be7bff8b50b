use crate::application::services::OperationQueue;
use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::{Package, QueueAction, QueueItem};
use crate::domain::errors::ActionError;
use crate::domain::repositories::{CatalogRepository, PackageStatusRepository};
use crate::domain::services::catalog_filter::{self, CatalogFilter};
use crate::domain::services::PackageValidator;
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct CheckToolInstalled {
    repository: Arc<dyn PackageStatusRepository>,
}

impl CheckToolInstalled {
    pub fn new(repository: Arc<dyn PackageStatusRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> bool {
        self.repository.is_tool_available().await
    }
}

pub struct ResolvePackageStatus {
    repository: Arc<dyn PackageStatusRepository>,
}

impl ResolvePackageStatus {
    pub fn new(repository: Arc<dyn PackageStatusRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: &str, cancel: &CancellationToken) -> Option<Package> {
        self.repository.resolve(id, cancel).await
    }
}

pub struct GetPackageDetails {
    repository: Arc<dyn PackageStatusRepository>,
}

impl GetPackageDetails {
    pub fn new(repository: Arc<dyn PackageStatusRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: &str, cancel: &CancellationToken) -> Option<Package> {
        self.repository.details(id, cancel).await
    }
}

/// Re-resolves every catalog package one after another, then persists the result.
pub struct RefreshCatalog {
    status: Arc<dyn PackageStatusRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl RefreshCatalog {
    pub fn new(
        status: Arc<dyn PackageStatusRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self { status, catalog }
    }

    pub async fn execute(&self, cancel: &CancellationToken) -> Result<Vec<Package>> {
        self.execute_filtered(&CatalogFilter::default(), cancel).await
    }

    /// Scans only the packages `filter` matches and returns them. The whole
    /// catalog is still saved, with unmatched entries unchanged.
    pub async fn execute_filtered(
        &self,
        filter: &CatalogFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>> {
        let mut packages = self
            .catalog
            .load_packages()
            .await
            .context("Failed to load catalog")?;
        let total = packages.iter().filter(|p| filter.matches(p)).count();
        tracing::info!("Scanning {} of {} catalog packages", total, packages.len());

        let mut unknown = 0;
        for package in packages.iter_mut().filter(|p| filter.matches(p)) {
            if cancel.is_cancelled() {
                tracing::info!("Catalog scan canceled");
                break;
            }
            if !self.status.refresh(package, cancel).await {
                unknown += 1;
            }
        }
        if unknown > 0 {
            tracing::warn!("Status of {} packages could not be determined", unknown);
        }

        self.catalog.save_packages(&packages).await?;
        Ok(filter.apply(&packages))
    }
}

/// Catalog entries as last saved, narrowed by a filter. Never queries the tool.
pub struct FilterCatalog {
    catalog: Arc<dyn CatalogRepository>,
}

impl FilterCatalog {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self, filter: &CatalogFilter) -> Result<Vec<Package>> {
        let packages = self.catalog.load_packages().await?;
        Ok(filter.apply(&packages))
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let packages = self.catalog.load_packages().await?;
        Ok(catalog_filter::categories(&packages))
    }
}

/// Re-resolves one catalog package and saves the catalog. Used after a queue
/// item completes.
pub struct RefreshCatalogPackage {
    status: Arc<dyn PackageStatusRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl RefreshCatalogPackage {
    pub fn new(
        status: Arc<dyn PackageStatusRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self { status, catalog }
    }

    /// Returns `false` when the package is not in the catalog or its status
    /// could not be determined.
    pub async fn execute(&self, id: &str) -> Result<bool> {
        let mut packages = self.catalog.load_packages().await?;
        let Some(package) = packages.iter_mut().find(|p| p.id == id) else {
            tracing::debug!("Package {} is not in the catalog, skipping refresh", id);
            return Ok(false);
        };

        if !self.status.refresh(package, &CancellationToken::new()).await {
            return Ok(false);
        }
        self.catalog.save_packages(&packages).await?;
        Ok(true)
    }
}

pub struct AddCustomPackage {
    catalog: Arc<dyn CatalogRepository>,
}

impl AddCustomPackage {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self, package: Package) -> Result<bool> {
        PackageValidator::validate(&package.id)?;
        self.catalog.add_to_custom(package).await
    }
}

pub struct RemoveCustomPackage {
    catalog: Arc<dyn CatalogRepository>,
}

impl RemoveCustomPackage {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self, id: &str) -> Result<bool> {
        self.catalog.remove_from_custom(id).await
    }
}

pub struct EnqueueOperation {
    queue: Arc<OperationQueue>,
}

impl EnqueueOperation {
    pub fn new(queue: Arc<OperationQueue>) -> Self {
        Self { queue }
    }

    /// Rejects ids that could be taken for command-line flags before anything
    /// reaches the queue.
    pub fn execute(&self, id: &str, action: QueueAction) -> Result<u64, ActionError> {
        PackageValidator::validate(id)?;
        Ok(self.queue.enqueue(QueueItem::new(id, action)))
    }
}

/// Result of queueing an action for several packages at once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub queued: Vec<u64>,
    /// Ids left out, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Queues one action for several packages. Installs skip packages that are
/// already installed; uninstalls and upgrades only touch installed ones.
pub struct EnqueueSelected {
    queue: Arc<OperationQueue>,
}

impl EnqueueSelected {
    pub fn new(queue: Arc<OperationQueue>) -> Self {
        Self { queue }
    }

    pub fn execute(&self, packages: &[Package], action: QueueAction) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::default();
        if packages.is_empty() {
            tracing::info!("No packages selected");
            return outcome;
        }

        for package in packages {
            let applies = match action {
                QueueAction::Install => !package.is_installed,
                QueueAction::Uninstall | QueueAction::Upgrade => package.is_installed,
            };
            if !applies {
                let reason = if package.is_installed {
                    "already installed"
                } else {
                    "not installed"
                };
                tracing::info!("Skipping {} of {}: {}", action, package.id, reason);
                outcome.skipped.push((package.id.clone(), reason.to_string()));
                continue;
            }
            if let Err(e) = PackageValidator::validate(&package.id) {
                outcome.skipped.push((package.id.clone(), e.to_string()));
                continue;
            }

            tracing::info!("Enqueueing {} of {}", action, package.id);
            let item = QueueItem::new(package.id.clone(), action);
            outcome.queued.push(self.queue.enqueue(item));
        }
        outcome
    }
}

pub struct CancelOperation {
    queue: Arc<OperationQueue>,
}

impl CancelOperation {
    pub fn new(queue: Arc<OperationQueue>) -> Self {
        Self { queue }
    }

    pub fn execute(&self, item_id: u64) -> bool {
        self.queue.cancel(item_id)
    }
}
