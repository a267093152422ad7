use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::WatermarkPolicy;
use crate::error::SyncError;

pub const DEFAULT_CONFIG_FILE: &str = "catalog-sync.json";
pub const DEFAULT_CATALOG_URL: &str =
    "https://data.cms.gov/provider-data/api/1/metastore/schemas/dataset/items";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub catalog_url: String,
    pub data_root: Utf8PathBuf,
    pub watermark_path: Utf8PathBuf,
    pub theme: String,
    pub max_workers: usize,
    pub timeout_secs: u64,
    pub watermark_policy: WatermarkPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            data_root: Utf8PathBuf::from("data"),
            watermark_path: Utf8PathBuf::from("run_metadata.json"),
            theme: "Hospitals".to_string(),
            max_workers: 8,
            timeout_secs: 60,
            watermark_policy: WatermarkPolicy::Observed,
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; without one, `catalog-sync.json` is used
    /// when present and the built-in defaults otherwise.
    pub fn resolve(path: Option<&str>) -> Result<SyncConfig, SyncError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(SyncConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SyncError::ConfigRead(config_path.clone()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<SyncConfig, SyncError> {
        let config: SyncConfig = serde_json::from_str(content)
            .map_err(|err| SyncError::ConfigParse(err.to_string()))?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &SyncConfig) -> Result<(), SyncError> {
        if config.catalog_url.trim().is_empty() {
            return Err(SyncError::InvalidConfig("catalog_url is empty".to_string()));
        }
        if config.theme.trim().is_empty() {
            return Err(SyncError::InvalidConfig("theme is empty".to_string()));
        }
        if config.max_workers == 0 {
            return Err(SyncError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if config.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config =
            ConfigLoader::parse(r#"{"theme": "Nursing homes", "max_workers": 2}"#).unwrap();
        assert_eq!(config.theme, "Nursing homes");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.watermark_policy, WatermarkPolicy::Observed);
    }
}
