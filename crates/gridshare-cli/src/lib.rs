//! Gridshare CLI Library
//!
//! Support code for the `gridshare` binary:
//! - [`config`]: layered CLI configuration (file, environment, flags)
//! - [`scenario`]: scenario files and the step replayer
//! - [`output`]: text and JSON rendering of replay results

pub mod config;
pub mod output;
pub mod scenario;

pub use config::{CliConfig, OutputConfig, OutputFormat};
pub use output::{render_run, write_snapshot, RunSummary};
pub use scenario::{Scenario, ScenarioError, ScenarioRun, Step, StepReport};

/// CLI error types
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] gridshare_core::ConfigError),

    /// Scenario could not be loaded or is invalid
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Snapshot could not be encoded
    #[error(transparent)]
    Snapshot(#[from] gridshare_core::SnapshotError),

    /// Report could not be encoded
    #[error("failed to encode report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output file could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}
