// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! CLI configuration
//!
//! Values are layered: the YAML file, then `BLOBSTAGE_*` environment
//! variables, then command-line flags.

use anyhow::{Context, Result};
use blobstage::ReaderOptions;
use blobstage::location::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "blobstage.yaml";
pub const CONNECTION_ENV: &str = "BLOBSTAGE_CONNECTION";
pub const CONTAINER_ENV: &str = "BLOBSTAGE_CONTAINER";
pub const PATH_ENV: &str = "BLOBSTAGE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Object store URL or Azure storage connection string
    #[serde(default)]
    pub connection: String,

    #[serde(default)]
    pub container: String,

    /// Object path inside the container
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub threshold_megabytes: Option<u64>,

    /// Forwarded to the object store builder (region, endpoint, credentials)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub connection: Option<String>,
    pub container: Option<String>,
    pub path: Option<String>,
    pub threshold_megabytes: Option<u64>,
}

impl BlobConfig {
    /// Apply `BLOBSTAGE_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(CONNECTION_ENV) {
            self.connection = value;
        }
        if let Some(value) = lookup(CONTAINER_ENV) {
            self.container = value;
        }
        if let Some(value) = lookup(PATH_ENV) {
            self.path = value;
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(value) = overrides.connection {
            self.connection = value;
        }
        if let Some(value) = overrides.container {
            self.container = value;
        }
        if let Some(value) = overrides.path {
            self.path = value;
        }
        if overrides.threshold_megabytes.is_some() {
            self.threshold_megabytes = overrides.threshold_megabytes;
        }
    }

    #[must_use]
    pub fn reader_options(&self) -> ReaderOptions {
        match self.threshold_megabytes {
            Some(megabytes) => ReaderOptions::default().with_threshold_megabytes(megabytes),
            None => ReaderOptions::default(),
        }
    }
}

/// Load configuration from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BlobConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: BlobConfig = serde_yaml_ng::from_str(&content)
        .with_context(|| "Failed to parse YAML configuration")?;
    Ok(config)
}

/// Load `path` when given, else the default file if present, else defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<BlobConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => Ok(BlobConfig::default()),
    }
}

/// Validate configuration after all layers are applied
pub fn validate_config(config: &BlobConfig) -> Result<()> {
    if config.connection.trim().is_empty() {
        anyhow::bail!("connection cannot be empty (set it in the config file or {CONNECTION_ENV})");
    }
    if normalize(&config.container).is_empty() {
        anyhow::bail!("container cannot be empty (set it in the config file or {CONTAINER_ENV})");
    }
    if normalize(&config.path).is_empty() {
        anyhow::bail!("path cannot be empty (set it in the config file or {PATH_ENV})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn complete() -> BlobConfig {
        BlobConfig {
            connection: "file:///data".to_string(),
            container: "items".to_string(),
            path: "items.parquet".to_string(),
            ..BlobConfig::default()
        }
    }

    #[test]
    fn test_parse_yaml() -> TestResult {
        let yaml = r#"
connection: "s3://"
container: items
path: /2025/items.parquet
threshold_megabytes: 16
options:
  region: us-west-2
"#;
        let config: BlobConfig = serde_yaml_ng::from_str(yaml)?;
        assert_eq!(config.container, "items");
        assert_eq!(config.threshold_megabytes, Some(16));
        assert_eq!(config.options.get("region").map(String::as_str), Some("us-west-2"));
        assert_eq!(config.reader_options().staging_threshold_bytes, 16 * 1024 * 1024);
        Ok(())
    }

    #[test]
    fn test_layers_apply_in_order() {
        let mut config = complete();
        config.apply_env(|key| (key == CONTAINER_ENV).then(|| "from-env".to_string()));
        assert_eq!(config.container, "from-env");
        assert_eq!(config.path, "items.parquet");

        config.apply_overrides(ConfigOverrides {
            container: Some("from-flag".to_string()),
            threshold_megabytes: Some(1),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.container, "from-flag");
        assert_eq!(config.threshold_megabytes, Some(1));
        assert_eq!(config.connection, "file:///data");
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(validate_config(&complete()).is_ok());

        let mut config = complete();
        config.container = "///".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = complete();
        config.connection = " ".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = complete();
        config.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config("/definitely/not/here.yaml").err();
        assert!(err.is_some_and(|e| e.to_string().contains("Failed to read config file")));
    }
}
