use crate::domain::entities::Package;
use crate::domain::repositories::CatalogRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CATALOG_FILE: &str = "catalog_default.json";
const CUSTOM_CATALOG_FILE: &str = "catalog_custom.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    packages: Vec<Package>,
}

/// Catalog stored as two JSON files: the default list (seeded on first use and
/// rewritten after scans) and the user's custom additions.
pub struct JsonCatalogRepository {
    default_path: PathBuf,
    custom_path: PathBuf,
}

impl JsonCatalogRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            default_path: data_dir.join(DEFAULT_CATALOG_FILE),
            custom_path: data_dir.join(CUSTOM_CATALOG_FILE),
        }
    }

    async fn default_catalog(&self) -> Result<Vec<Package>> {
        if !tokio::fs::try_exists(&self.default_path).await.unwrap_or(false) {
            tracing::info!("Creating default catalog at {}", self.default_path.display());
            write_catalog(&self.default_path, &seed_packages()).await?;
        }
        Ok(read_catalog(&self.default_path).await)
    }

    async fn custom_catalog(&self) -> Vec<Package> {
        if !tokio::fs::try_exists(&self.custom_path).await.unwrap_or(false) {
            return Vec::new();
        }
        read_catalog(&self.custom_path).await
    }
}

#[async_trait]
impl CatalogRepository for JsonCatalogRepository {
    async fn load_packages(&self) -> Result<Vec<Package>> {
        let defaults = self.default_catalog().await?;
        tracing::info!("Default catalog count: {}", defaults.len());
        let custom = self.custom_catalog().await;
        tracing::info!("Custom catalog count: {}", custom.len());

        let merged = merge_by_id(defaults, custom);
        tracing::info!("Merged catalog count: {}", merged.len());
        Ok(merged)
    }

    async fn save_packages(&self, packages: &[Package]) -> Result<()> {
        write_catalog(&self.default_path, packages).await?;
        tracing::info!("Catalog saved with {} packages", packages.len());
        Ok(())
    }

    async fn add_to_custom(&self, package: Package) -> Result<bool> {
        let mut custom = self.custom_catalog().await;
        if custom.iter().any(|p| p.id == package.id) {
            tracing::warn!("Package {} already exists in catalog", package.id);
            return Ok(false);
        }

        let id = package.id.clone();
        custom.push(package);
        write_catalog(&self.custom_path, &custom).await?;
        tracing::info!("Package {} added to catalog", id);
        Ok(true)
    }

    async fn remove_from_custom(&self, package_id: &str) -> Result<bool> {
        let mut custom = self.custom_catalog().await;
        let before = custom.len();
        custom.retain(|p| p.id != package_id);
        if custom.len() == before {
            return Ok(false);
        }

        write_catalog(&self.custom_path, &custom).await?;
        tracing::info!("Package {} removed from catalog", package_id);
        Ok(true)
    }
}

/// Later entries replace earlier ones with the same id, keeping first-seen order.
fn merge_by_id(defaults: Vec<Package>, custom: Vec<Package>) -> Vec<Package> {
    let mut merged: Vec<Package> = Vec::with_capacity(defaults.len() + custom.len());
    for package in defaults.into_iter().chain(custom) {
        match merged.iter_mut().find(|p| p.id == package.id) {
            Some(existing) => *existing = package,
            None => merged.push(package),
        }
    }
    merged
}

/// An unreadable catalog is treated as empty rather than failing the caller.
async fn read_catalog(path: &Path) -> Vec<Package> {
    match try_read_catalog(path).await {
        Ok(file) => file.packages,
        Err(e) => {
            tracing::error!("Failed to load catalog from {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

async fn try_read_catalog(path: &Path) -> Result<CatalogFile> {
    let json = tokio::fs::read_to_string(path)
        .await
        .context("Failed to read catalog file")?;
    serde_json::from_str(&json).context("Failed to parse catalog JSON")
}

async fn write_catalog(path: &Path, packages: &[Package]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create catalog directory")?;
    }

    let file = CatalogFile {
        packages: packages.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).context("Failed to serialize catalog")?;

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write catalog to {}", path.display()))
}

fn seed_packages() -> Vec<Package> {
    vec![
        Package::new("Google.Chrome")
            .with_name("Google Chrome")
            .with_category("Browsers")
            .with_tags(&["browser", "popular", "google"])
            .with_description("Fast and secure web browser"),
        Package::new("7zip.7zip")
            .with_name("7-Zip")
            .with_category("Utilities")
            .with_tags(&["compression", "archive", "utility"])
            .with_description("File archiver with high compression ratio"),
        Package::new("Microsoft.VisualStudioCode")
            .with_name("Visual Studio Code")
            .with_category("Development")
            .with_tags(&["editor", "coding", "popular", "microsoft"])
            .with_description("Code editor with support for debugging and extensions"),
        Package::new("Discord.Discord")
            .with_name("Discord")
            .with_category("Communication")
            .with_tags(&["chat", "voice", "gaming", "popular"])
            .with_description("Voice, video, and text communication platform"),
        Package::new("Notepad++.Notepad++")
            .with_name("Notepad++")
            .with_category("Development")
            .with_tags(&["editor", "text", "coding"])
            .with_description("Free source code editor and Notepad replacement"),
    ]
}
