use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Persist banks, cards and rules in the data directory.
    #[default]
    Disk,
    /// Keep everything in memory for the lifetime of the process.
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageBackend,
    pub data_path: Option<String>,
    /// Suffix shown after amounts, e.g. "RUB".
    pub currency: Option<String>,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "cashback-helper", "cbhelper")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "cashback-helper", "cbhelper")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
storage: memory
currency: "RUB"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.currency.as_deref(), Some("RUB"));
        assert!(config.data_path.is_none());

        let yaml_str_with_path = r#"
data_path: "/tmp/cbhelper"
        "#;
        let config_with_path: AppConfig = serde_yaml::from_str(yaml_str_with_path).unwrap();
        assert_eq!(config_with_path.storage, StorageBackend::Disk);
        assert_eq!(
            config_with_path.default_data_path().unwrap(),
            PathBuf::from("/tmp/cbhelper")
        );
        assert!(config_with_path.currency.is_none());
    }

    #[test]
    fn test_rejects_unknown_storage_backend() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("storage: cloud\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
