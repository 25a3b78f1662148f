//! Report rendering

use crate::config::OutputFormat;
use crate::scenario::{ScenarioRun, StepReport};
use crate::CliError;
use gridshare_core::Receipt;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// JSON form of a replay
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    /// Per-step results
    pub steps: &'a [StepReport],
    /// Receipts committed during the replay
    pub receipts: &'a [Receipt],
    /// Number of steps that did not match
    pub mismatches: usize,
    /// Digest of the final ledger state
    pub state_digest: String,
}

impl<'a> RunSummary<'a> {
    /// Summarize a finished replay.
    pub fn new(run: &'a ScenarioRun) -> Result<Self, CliError> {
        Ok(Self {
            steps: &run.reports,
            receipts: run.ledger.receipts(),
            mismatches: run.mismatches().count(),
            state_digest: run.ledger.state_digest()?,
        })
    }
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in self.steps {
            writeln!(f, "{step}")?;
        }
        writeln!(f)?;
        for receipt in self.receipts {
            writeln!(f, "{receipt}")?;
        }
        writeln!(
            f,
            "{} steps, {} receipts, {} mismatches",
            self.steps.len(),
            self.receipts.len(),
            self.mismatches
        )?;
        write!(f, "state digest {}", self.state_digest)
    }
}

/// Render a replay in the configured format.
pub fn render_run(run: &ScenarioRun, format: OutputFormat) -> Result<String, CliError> {
    let summary = RunSummary::new(run)?;
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => Ok(summary.to_string()),
    }
}

/// Write the final ledger snapshot of a replay as pretty JSON.
pub fn write_snapshot(run: &ScenarioRun, path: &Path) -> Result<(), CliError> {
    let json = run.ledger.snapshot().to_json_pretty()?;
    std::fs::write(path, json).map_err(|source| CliError::Write {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), sequence = run.ledger.sequence(), "snapshot written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use gridshare_core::LedgerConfig;

    fn replay() -> ScenarioRun {
        Scenario::parse(
            "[[step]]\ncaller = \"wallet_1\"\nop = \"register-producer\"\namount = 5\nprice = 2\n",
            "inline",
        )
        .unwrap()
        .run(LedgerConfig::new("deployer"))
    }

    #[test]
    fn text_lists_steps_and_receipts() {
        let text = render_run(&replay(), OutputFormat::Text).unwrap();
        assert!(text.contains("[1] wallet_1 register-producer -> (ok true)"));
        assert!(text.contains("#1 register-producer by wallet_1"));
        assert!(text.contains("1 steps, 1 receipts, 0 mismatches"));
        assert!(text.lines().last().unwrap().starts_with("state digest "));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn json_is_a_single_document() {
        let json = render_run(&replay(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"][0]["result"], "(ok true)");
        assert_eq!(value["receipts"][0]["fact"]["kind"], "producer_registered");
        assert_eq!(value["mismatches"], 0);
        assert_eq!(value["state_digest"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn snapshot_file_restores() {
        let run = replay();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_snapshot(&run, &path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let snapshot = gridshare_core::LedgerSnapshot::from_json(&json).unwrap();
        let restored =
            gridshare_core::Ledger::restore(LedgerConfig::new("deployer"), snapshot).unwrap();
        assert_eq!(restored.producer_count(), 1);
    }
}
