use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel a package resolves from when the tool does not say otherwise.
pub const DEFAULT_SOURCE: &str = "winget";

/// Registry channels the tool is known to print in its source column.
pub const KNOWN_SOURCES: [&str; 2] = ["winget", "msstore"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub source: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_installed: bool,
    pub installed_version: String,
    pub available_version: String,
    pub update_available: bool,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for Package {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            source: DEFAULT_SOURCE.to_string(),
            description: String::new(),
            category: String::new(),
            tags: Vec::new(),
            is_installed: false,
            installed_version: String::new(),
            available_version: String::new(),
            update_available: false,
            last_checked: None,
        }
    }
}

impl Package {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_installed_version(mut self, version: impl Into<String>) -> Self {
        self.installed_version = version.into();
        self
    }

    pub fn with_available_version(mut self, version: impl Into<String>) -> Self {
        self.available_version = version.into();
        self
    }

    pub fn set_installed(mut self, installed: bool) -> Self {
        self.is_installed = installed;
        self
    }

    pub fn set_update_available(mut self, update_available: bool) -> Self {
        self.update_available = update_available;
        self
    }

    pub fn checked_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked = Some(at);
        self
    }

    /// Copies the status snapshot of `resolved` onto this package, leaving the
    /// catalog metadata (name, description, category, tags) alone.
    pub fn apply_status(&mut self, resolved: &Package) {
        self.source = resolved.source.clone();
        self.is_installed = resolved.is_installed;
        self.installed_version = resolved.installed_version.clone();
        self.available_version = resolved.available_version.clone();
        self.update_available = resolved.update_available;
        self.last_checked = resolved.last_checked;
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_package_defaults_to_primary_source() {
        let package = Package::new("Google.Chrome");

        assert_eq!(package.source, "winget");
        assert!(!package.is_installed);
        assert!(package.installed_version.is_empty());
        assert!(package.last_checked.is_none());
    }

    #[test]
    fn test_apply_status_keeps_catalog_metadata() {
        let mut catalog = Package::new("7zip.7zip")
            .with_name("7-Zip")
            .with_category("Utilities");
        let resolved = Package::new("7zip.7zip")
            .set_installed(true)
            .with_installed_version("23.01")
            .with_available_version("24.08")
            .set_update_available(true)
            .checked_at(Utc::now());

        catalog.apply_status(&resolved);

        assert_eq!(catalog.name, "7-Zip");
        assert_eq!(catalog.category, "Utilities");
        assert!(catalog.is_installed);
        assert_eq!(catalog.installed_version, "23.01");
        assert_eq!(catalog.available_version, "24.08");
        assert!(catalog.update_available);
        assert!(catalog.last_checked.is_some());
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let package: Package = serde_json::from_str(r#"{"id":"Discord.Discord"}"#).unwrap();

        assert_eq!(package.id, "Discord.Discord");
        assert_eq!(package.source, "winget");
        assert!(package.tags.is_empty());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(Package::new("Foo.Bar").display_name(), "Foo.Bar");
        assert_eq!(Package::new("Foo.Bar").with_name("Bar").display_name(), "Bar");
    }
}
