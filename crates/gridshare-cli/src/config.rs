//! CLI configuration
//!
//! Layers, lowest to highest precedence: built-in defaults, the TOML config
//! file, `GRIDSHARE_OWNER`, then command-line flags. A missing config file is
//! not an error; the remaining layers must still supply an owner.

use gridshare_core::{load_toml, ConfigError, LedgerConfig, PrincipalId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How replay results are printed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Host-style lines, one per step
    #[default]
    Text,
    /// A single JSON document
    Json,
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Ledger construction parameters (`[ledger]`)
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Output settings (`[output]`)
    #[serde(default)]
    pub output: OutputConfig,
}

impl CliConfig {
    /// Load the config file, or defaults if it does not exist.
    ///
    /// No overrides are applied and nothing is validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        load_toml(path)
    }

    /// Load, apply the environment and flag overrides, and validate.
    pub fn resolve(
        path: &Path,
        owner: Option<PrincipalId>,
        format: Option<OutputFormat>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.ledger.merge_with_env();
        if let Some(owner) = owner {
            config.ledger.owner = owner;
        }
        if let Some(format) = format {
            config.output.format = format;
        }
        config.ledger.validate()?;
        tracing::debug!(
            owner = %config.ledger.owner,
            format = ?config.output.format,
            "configuration resolved"
        );
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_ledger_and_output_tables() {
        let config: CliConfig = toml::from_str(
            r#"
            [ledger]
            owner = "deployer"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.owner, PrincipalId::new("deployer"));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }
}
