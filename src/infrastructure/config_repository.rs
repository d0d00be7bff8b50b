use crate::domain::entities::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "wingman";

pub struct ConfigRepository {
    config_path: PathBuf,
}

impl ConfigRepository {
    pub fn new() -> Self {
        let config_dir = if let Ok(appdata) = std::env::var("APPDATA") {
            PathBuf::from(appdata).join(APP_DIR)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join(APP_DIR)
        } else {
            PathBuf::from(".")
        };

        Self::with_path(config_dir.join("config.json"))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .context("Failed to read config file")?;

        let config = serde_json::from_str(&content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config)
            .context("Failed to serialize config")?;

        fs::write(&self.config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory holding the catalog files: the configured override, else the
/// platform's local data directory.
pub fn data_dir(config: &AppConfig) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        return PathBuf::from(local).join(APP_DIR);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
    }
    PathBuf::from(".").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("wingman-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let repository = ConfigRepository::with_path(scratch_dir("missing").join("config.json"));

        assert_eq!(repository.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir("roundtrip");
        let repository = ConfigRepository::with_path(dir.join("nested").join("config.json"));
        let config = AppConfig {
            query_timeout_secs: 3,
            data_dir: Some(dir.join("data")),
            ..AppConfig::default()
        };

        repository.save(&config).unwrap();

        assert_eq!(repository.load().unwrap(), config);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let error = ConfigRepository::with_path(&path).load().unwrap_err();

        assert!(error.to_string().contains("Failed to parse config file"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_data_dir_override() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/catalogs")),
            ..AppConfig::default()
        };

        assert_eq!(data_dir(&config), PathBuf::from("/tmp/catalogs"));
    }
}
