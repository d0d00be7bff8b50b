use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::Package;
use crate::domain::repositories::PackageStatusRepository;
use crate::domain::services::PackageValidator;
use crate::domain::services::output_parser::{
    has_no_update, is_not_installed, parse_available_version, parse_listing, parse_show,
};
use crate::infrastructure::winget::command::WingetCommand;
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Single source of truth for a package's installed/available status.
///
/// Every call re-queries the tool; callers decide how often to refresh.
pub struct PackageInfoResolver {
    command: Arc<WingetCommand>,
}

impl PackageInfoResolver {
    pub fn new(command: Arc<WingetCommand>) -> Self {
        Self { command }
    }

    async fn try_resolve(&self, id: &str, cancel: &CancellationToken) -> Result<Package> {
        PackageValidator::validate(id)?;

        let mut listing = self.command.list_exact(id, cancel).await;
        if is_not_installed(&listing) && !cancel.is_cancelled() {
            tracing::info!("Exact match failed for {}, trying partial match", id);
            listing = self.command.list_partial(id, cancel).await;
        }
        if cancel.is_cancelled() {
            bail!("status check canceled");
        }

        if is_not_installed(&listing) {
            tracing::debug!("Package {} not installed", id);
            return Ok(Package::new(id).set_installed(false).checked_at(Utc::now()));
        }

        let listing = parse_listing(&listing);
        let installed_version = listing.installed_version.unwrap_or_default();

        let upgrade_output = self.command.upgrade_check(id, cancel).await;
        if cancel.is_cancelled() {
            bail!("update check canceled");
        }

        let mut update_available = false;
        let mut available_version = installed_version.clone();
        if !upgrade_output.trim().is_empty() && !has_no_update(&upgrade_output) {
            let parsed = parse_available_version(&upgrade_output);
            if parsed.is_empty() || parsed == installed_version {
                tracing::debug!("Upgrade output for {} did not yield a newer version", id);
            } else {
                update_available = true;
                available_version = parsed;
            }
        }

        tracing::info!(
            "Package {} scanned - Installed: {}, Available: {}",
            id,
            installed_version,
            available_version
        );

        Ok(Package::new(id)
            .with_source(listing.source)
            .set_installed(true)
            .with_installed_version(installed_version)
            .with_available_version(available_version)
            .set_update_available(update_available)
            .checked_at(Utc::now()))
    }
}

#[async_trait]
impl PackageStatusRepository for PackageInfoResolver {
    async fn resolve(&self, id: &str, cancel: &CancellationToken) -> Option<Package> {
        tracing::info!("Checking package {}", id);
        match self.try_resolve(id, cancel).await {
            Ok(package) => Some(package),
            Err(e) => {
                tracing::error!("Failed to scan package {}: {:#}", id, e);
                None
            }
        }
    }

    async fn details(&self, id: &str, cancel: &CancellationToken) -> Option<Package> {
        if !PackageValidator::validate_package_id(id) {
            tracing::warn!("Refusing to look up invalid package id {:?}", id);
            return None;
        }

        let output = self.command.show(id, cancel).await;
        let details = parse_show(&output)?;
        let mut package = Package::new(id)
            .with_name(details.name)
            .with_description(details.description)
            .with_available_version(details.version);
        if !details.publisher.is_empty() {
            package.tags.push(details.publisher);
        }
        Some(package)
    }

    async fn is_tool_available(&self) -> bool {
        let version = self.command.version().await;
        let available = !version.trim().is_empty();
        if available {
            tracing::debug!("{} version {}", self.command.tool(), version.trim());
        } else {
            tracing::warn!("{} is not available", self.command.tool());
        }
        available
    }
}
