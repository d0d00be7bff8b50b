use crate::domain::entities::Package;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Default catalog merged with the user's custom entries, keyed by id.
    async fn load_packages(&self) -> Result<Vec<Package>>;
    async fn save_packages(&self, packages: &[Package]) -> Result<()>;
    /// Returns `false` when a package with the same id is already listed.
    async fn add_to_custom(&self, package: Package) -> Result<bool>;
    /// Returns `false` when no custom entry had that id.
    async fn remove_from_custom(&self, package_id: &str) -> Result<bool>;
}
