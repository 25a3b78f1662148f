//! Ledger configuration
//!
//! The owner identity authorized for admin operations is fixed when the ledger
//! is constructed. It comes from configuration, never from mutable state.

use crate::identifiers::PrincipalId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that overrides the configured owner.
pub const OWNER_ENV_VAR: &str = "GRIDSHARE_OWNER";

/// Configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was being parsed
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A field failed validation
    #[error("invalid configuration: field '{field}' {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Read and parse a TOML file into `T`, naming the file in any error.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Ledger construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Principal allowed to call `set-energy-price`
    #[serde(default)]
    pub owner: PrincipalId,
}

impl LedgerConfig {
    /// Config with the given owner.
    pub fn new(owner: impl Into<PrincipalId>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    /// Load a bare ledger config (`owner = "..."`) from a TOML file.
    ///
    /// The environment override is applied and the result validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config: LedgerConfig = load_toml(path)?;
        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `GRIDSHARE_OWNER` if it is set and non-blank.
    pub fn merge_with_env(&mut self) {
        if let Ok(owner) = std::env::var(OWNER_ENV_VAR) {
            self.merge_owner(&owner);
        }
    }

    /// Replace the owner with `owner` unless it is blank.
    pub fn merge_owner(&mut self, owner: &str) {
        match owner.parse::<PrincipalId>() {
            Ok(parsed) => self.owner = parsed,
            Err(_) => tracing::warn!(
                owner = %self.owner,
                "ignoring blank owner override, keeping configured owner"
            ),
        }
    }

    /// Reject configurations a ledger cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_empty() {
            return Err(ConfigError::Invalid {
                field: "owner",
                reason: "must name the ledger owner principal".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_fails_validation() {
        let err = LedgerConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("owner"));
    }

    #[test]
    fn merge_owner_ignores_blank_values() {
        let mut config = LedgerConfig::new("deployer");
        config.merge_owner("   ");
        assert_eq!(config.owner, PrincipalId::new("deployer"));
        config.merge_owner("admin");
        assert_eq!(config.owner, PrincipalId::new("admin"));
    }

    #[test]
    fn loads_owner_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "owner = \"deployer\"").unwrap();
        let config = LedgerConfig::load_from_file(file.path()).unwrap();
        // GRIDSHARE_OWNER may be set in the environment running the tests
        if std::env::var(OWNER_ENV_VAR).is_err() {
            assert_eq!(config.owner, PrincipalId::new("deployer"));
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_toml_reports_missing_files_as_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_toml::<LedgerConfig>(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "owner = [").unwrap();
        let err = LedgerConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
