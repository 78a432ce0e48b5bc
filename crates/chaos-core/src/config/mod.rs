//! Configuration types for the chaos synthesizer.
//!
//! Configuration is loaded from a single YAML file (`chaos.yaml` by
//! default). Every field has a default, so an empty file or no file at all
//! yields the settings of the stock demos.
//!
//! # Example
//!
//! ```yaml
//! output_dir: chaos.out
//! environment:
//!   account: "111122223333"
//!   region: us-east-1
//! demos:
//!   two:
//!     chaos:
//!       fault_type: latency
//!       delay: 800
//! ```

pub mod demos;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Environment;

pub use demos::{
    ConcurrencyDemoConfig, DemosConfig, ExperimentSettings, ExtensionDemoConfig,
    ExtensionLayerConfig, FaultSettings, HandlerReplacementDemoConfig,
};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "chaos.yaml";

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Directory templates are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Target environment. Unset values stay deferred in the templates.
    #[serde(default)]
    pub environment: Environment,

    /// Directory holding automation documents that replace the built-in ones.
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,

    /// Per-demo settings.
    #[serde(default)]
    pub demos: DemosConfig,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            environment: Environment::default(),
            documents_dir: None,
            demos: DemosConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("chaos.out")
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChaosConfig {
    /// Load configuration from a YAML file.
    ///
    /// A relative `documents_dir` is resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(dir) = &config.documents_dir {
            if dir.is_relative() {
                let base_dir = path
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                config.documents_dir = Some(base_dir.join(dir));
            }
        }
        Ok(config)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // serde_yaml reads an empty document as null rather than an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, else `chaos.yaml` if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Re-run validation, e.g. after command-line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(account) = &self.environment.account {
            if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Config(format!(
                    "environment.account must be a 12-digit account id, got '{}'",
                    account
                )));
            }
        }
        self.demos.validate().map_err(ConfigError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ChaosConfig::from_yaml("").unwrap();
        assert_eq!(config, ChaosConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("chaos.out"));
        assert!(config.environment.account.is_none());
        assert!(config.demos.one.settings.enabled);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = ChaosConfig::from_yaml(
            r#"
environment:
  account: "111122223333"
  region: us-east-1
demos:
  two:
    chaos:
      fault_type: latency
      delay: 800
"#,
        )
        .unwrap();
        assert_eq!(config.environment.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.demos.two.chaos.fault_type, "latency");
        assert_eq!(config.demos.two.chaos.delay, 800);
        assert_eq!(config.demos.two.chaos.error_code, 404);
        assert_eq!(config.demos.one.concurrency_level, 10);
    }

    #[test]
    fn test_invalid_account_rejected() {
        let err = ChaosConfig::from_yaml("environment:\n  account: abc\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_from_file_resolves_documents_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaos.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "documents_dir: docs").unwrap();

        let config = ChaosConfig::from_file(&path).unwrap();
        assert_eq!(config.documents_dir, Some(dir.path().join("docs")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ChaosConfig::from_file("/nonexistent/chaos.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
