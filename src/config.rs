//! Application configuration: where chains and preferences live.
//!
//! Resolution order for the data directory:
//! 1. `--data-dir` on the command line
//! 2. `BATCHCHAIN_DATA_DIR` in the environment
//! 3. `./.batchchain`
//!
//! A JSON config file (`--config`) can set the chains directory and settings
//! file independently.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "BATCHCHAIN_DATA_DIR";

const DEFAULT_DATA_DIR: &str = ".batchchain";

/// Paths used by the store and settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub chains_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_data_dir(DEFAULT_DATA_DIR)
    }
}

impl AppConfig {
    /// Standard layout below `data_dir`.
    pub fn for_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            chains_dir: data_dir.join("chains"),
            settings_file: data_dir.join("settings.json"),
            data_dir,
        }
    }

    /// Resolve from an explicit override, then the environment, then the default.
    pub fn resolve(data_dir: Option<&Path>) -> Self {
        match data_dir {
            Some(dir) => Self::for_data_dir(dir),
            None => std::env::var_os(DATA_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(|v| Self::for_data_dir(PathBuf::from(v)))
                .unwrap_or_default(),
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chains_dir.as_os_str().is_empty() {
            anyhow::bail!("Chains directory must be specified");
        }
        if self.settings_file.as_os_str().is_empty() {
            anyhow::bail!("Settings file must be specified");
        }
        if self.settings_file.starts_with(&self.chains_dir) {
            anyhow::bail!("Settings file must not live inside the chains directory");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_below_data_dir() {
        let config = AppConfig::for_data_dir("/srv/chains-data");
        assert_eq!(config.chains_dir, PathBuf::from("/srv/chains-data/chains"));
        assert_eq!(
            config.settings_file,
            PathBuf::from("/srv/chains-data/settings.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_dir_wins() {
        let config = AppConfig::resolve(Some(Path::new("/tmp/explicit")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().expect("tempdir"); // test: environment setup
        let path = dir.path().join("config.json");
        let config = AppConfig::for_data_dir(dir.path());
        config.save_to_file(&path).expect("save"); // test: writable dir
        assert_eq!(AppConfig::load_from_file(&path).expect("load"), config); // test: just saved
    }

    #[test]
    fn test_validate_rejects_settings_inside_chains_dir() {
        let mut config = AppConfig::for_data_dir("/data");
        config.settings_file = PathBuf::from("/data/chains/settings.json");
        assert!(config.validate().is_err());

        config.chains_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = AppConfig::load_from_file("/nonexistent/batchchain.json");
        assert!(result.is_err());
    }
}
