//! Scenario files and replay
//!
//! A scenario is a TOML list of `[[step]]` tables. Each step names the calling
//! principal, the operation (`op`) with its parameters, and optionally the
//! error code the step is expected to fail with:
//!
//! ```toml
//! [[step]]
//! caller = "wallet_2"
//! op = "rate-producer"
//! producer = "wallet_1"
//! stars = 5
//! expect_code = 107
//! ```
//!
//! Steps replay in order against a fresh ledger. A step matches when it
//! fails with its `expect_code`, or succeeds when none is given.

use gridshare_core::{Ledger, LedgerConfig, Operation, PrincipalId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Scenario loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Scenario file could not be read
    #[error("failed to read scenario {path}: {source}")]
    Io {
        /// Scenario path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Scenario is not valid TOML or names an unknown operation
    #[error("failed to parse scenario {path}: {source}")]
    Parse {
        /// Scenario path
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Scenario has no steps
    #[error("scenario has no steps")]
    Empty,

    /// A step is malformed
    #[error("step {step} is invalid: {reason}")]
    InvalidStep {
        /// 1-based step number
        step: usize,
        /// What is wrong with it
        reason: String,
    },
}

/// One call in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Principal signing the call
    pub caller: PrincipalId,
    /// Operation and its parameters
    #[serde(flatten)]
    pub operation: Operation,
    /// Error code the call must fail with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_code: Option<u32>,
}

/// An ordered list of calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Calls in replay order (`[[step]]`)
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse scenario TOML; `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> Result<Self, ScenarioError> {
        toml::from_str(content).map_err(|source| ScenarioError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Check that the scenario has steps and every principal is non-blank.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Empty);
        }
        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            if step.caller.is_empty() {
                return Err(ScenarioError::InvalidStep {
                    step: number,
                    reason: "caller is blank".to_string(),
                });
            }
            if let Some(name) = blank_parameter(&step.operation) {
                return Err(ScenarioError::InvalidStep {
                    step: number,
                    reason: format!("{name} parameter of {} is blank", step.operation.name()),
                });
            }
        }
        Ok(())
    }

    /// Replay every step against a fresh ledger owned by `config.owner`.
    pub fn run(&self, config: LedgerConfig) -> ScenarioRun {
        let mut ledger = Ledger::new(config);
        tracing::info!(steps = self.steps.len(), owner = %ledger.owner(), "replaying scenario");

        let reports = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let report = StepReport::execute(&mut ledger, index + 1, step);
                if !report.matched {
                    tracing::warn!(
                        step = report.step,
                        op = report.op,
                        result = %report.result,
                        expect_code = ?report.expect_code,
                        "step did not match expectation"
                    );
                }
                report
            })
            .collect();

        ScenarioRun { ledger, reports }
    }
}

fn blank_parameter(operation: &Operation) -> Option<&'static str> {
    let (consumer, producer) = match operation {
        Operation::BuyEnergy { producer, .. }
        | Operation::RateProducer { producer, .. }
        | Operation::RequestRefund { producer, .. }
        | Operation::SetEnergyPrice { producer, .. }
        | Operation::GetProducerInfo { producer }
        | Operation::GetProducerRating { producer }
        | Operation::GetPendingRevenue { producer } => (None, Some(producer)),
        Operation::GetConsumerInfo { consumer } => (Some(consumer), None),
        Operation::GetPurchaseRecord { consumer, producer } => (Some(consumer), Some(producer)),
        Operation::RegisterProducer { .. }
        | Operation::RegisterConsumer
        | Operation::WithdrawRevenue => (None, None),
    };
    if consumer.is_some_and(PrincipalId::is_empty) {
        Some("consumer")
    } else if producer.is_some_and(PrincipalId::is_empty) {
        Some("producer")
    } else {
        None
    }
}

/// Result of one replayed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number
    pub step: usize,
    /// Principal that signed the call
    pub caller: PrincipalId,
    /// Operation name
    pub op: &'static str,
    /// Host rendering, e.g. `(ok true)` or `(err u107)`
    pub result: String,
    /// Error code, if the call was rejected
    pub code: Option<u32>,
    /// Expected error code, if any
    pub expect_code: Option<u32>,
    /// Whether the result met the expectation
    pub matched: bool,
}

impl StepReport {
    fn execute(ledger: &mut Ledger, step: usize, call: &Step) -> Self {
        let (result, code) = match ledger.apply(&call.caller, &call.operation) {
            Ok(outcome) => (outcome.to_string(), None),
            Err(err) => (err.render(), Some(err.code())),
        };
        Self {
            step,
            caller: call.caller.clone(),
            op: call.operation.name(),
            result,
            code,
            expect_code: call.expect_code,
            matched: code == call.expect_code,
        }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {} -> {}", self.step, self.caller, self.op, self.result)?;
        if !self.matched {
            match self.expect_code {
                Some(code) => write!(f, "  MISMATCH: expected (err u{code})")?,
                None => write!(f, "  MISMATCH: expected success")?,
            }
        }
        Ok(())
    }
}

/// A replayed scenario: final ledger plus per-step reports
#[derive(Debug)]
pub struct ScenarioRun {
    /// Ledger after the last step
    pub ledger: Ledger,
    /// One report per step, in order
    pub reports: Vec<StepReport>,
}

impl ScenarioRun {
    /// Steps whose result did not meet the expectation.
    pub fn mismatches(&self) -> impl Iterator<Item = &StepReport> {
        self.reports.iter().filter(|report| !report.matched)
    }

    /// Whether every step matched.
    pub fn is_success(&self) -> bool {
        self.mismatches().next().is_none()
    }
}
