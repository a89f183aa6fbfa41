//! File-backed preferences.
//!
//! Writes go to memory; `flush` rewrites the whole file. The only key the
//! chain core uses is [`ACTIVE_CHAIN_KEY`], a last-selection-wins record of the
//! most recently used chain.

use crate::capabilities::Settings;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Preference key holding the last used chain name.
pub const ACTIVE_CHAIN_KEY: &str = "/Batch/ActiveChain";

/// Flat string map persisted as JSON.
#[derive(Debug, Clone)]
pub struct JsonSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonSettings {
    /// Load settings from `path`; a missing file starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings in {:?}", path))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Settings for JsonSettings {
    fn read_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn write_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize settings to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;
        Ok(())
    }
}
