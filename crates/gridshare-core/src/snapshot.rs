//! Serializable ledger state
//!
//! The host commits state after every operation; a snapshot is what it
//! persists. Rows are emitted in key order so equal states encode to equal
//! bytes and therefore equal digests. Receipts are history, not state, and are
//! left out.

use crate::config::LedgerConfig;
use crate::identifiers::PrincipalId;
use crate::ledger::Ledger;
use crate::types::{Consumer, Producer, PurchaseKey, PurchaseRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot encoding or restore failure
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// JSON encoding or decoding failed
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot was taken under a different owner
    #[error("snapshot owner {snapshot} does not match configured owner {configured}")]
    OwnerMismatch {
        /// Owner recorded in the snapshot
        snapshot: PrincipalId,
        /// Owner in the restoring configuration
        configured: PrincipalId,
    },

    /// A row appears twice
    #[error("duplicate {table} row for {key}")]
    DuplicateRow {
        /// Table name
        table: &'static str,
        /// Offending key
        key: String,
    },

    /// A row violates a ledger invariant
    #[error("invalid {table} row for {key}: {reason}")]
    InvalidRow {
        /// Table name
        table: &'static str,
        /// Offending key
        key: String,
        /// Violated invariant
        reason: &'static str,
    },
}

/// Producer row with its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerEntry {
    /// Producer identity
    pub principal: PrincipalId,
    /// Row contents
    #[serde(flatten)]
    pub producer: Producer,
}

/// Consumer row with its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerEntry {
    /// Consumer identity
    pub principal: PrincipalId,
    /// Row contents
    #[serde(flatten)]
    pub consumer: Consumer,
}

/// Purchase record with its composite key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    /// Consumer/producer pair
    #[serde(flatten)]
    pub key: PurchaseKey,
    /// Record contents
    #[serde(flatten)]
    pub record: PurchaseRecord,
}

/// Complete persisted ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Owner the ledger was administered by
    pub owner: PrincipalId,
    /// Last committed sequence number
    pub sequence: u64,
    /// Producer table in key order
    pub producers: Vec<ProducerEntry>,
    /// Consumer table in key order
    pub consumers: Vec<ConsumerEntry>,
    /// Purchase table in key order
    pub purchases: Vec<PurchaseEntry>,
}

impl LedgerSnapshot {
    /// Canonical JSON encoding.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Human-readable JSON encoding.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Hex BLAKE3 digest of the canonical encoding.
    pub fn digest(&self) -> Result<String, SnapshotError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

impl Ledger {
    /// Capture the current state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            owner: self.config.owner.clone(),
            sequence: self.sequence,
            producers: self
                .producers
                .iter()
                .map(|(principal, producer)| ProducerEntry {
                    principal: principal.clone(),
                    producer: *producer,
                })
                .collect(),
            consumers: self
                .consumers
                .iter()
                .map(|(principal, consumer)| ConsumerEntry {
                    principal: principal.clone(),
                    consumer: *consumer,
                })
                .collect(),
            purchases: self
                .purchases
                .iter()
                .map(|(key, record)| PurchaseEntry {
                    key: key.clone(),
                    record: *record,
                })
                .collect(),
        }
    }

    /// Digest of the current state; see [`LedgerSnapshot::digest`].
    pub fn state_digest(&self) -> Result<String, SnapshotError> {
        self.snapshot().digest()
    }

    /// Rebuild a ledger from a snapshot taken under the same owner.
    ///
    /// The receipt journal starts empty; new receipts continue numbering from
    /// the snapshot's sequence.
    pub fn restore(config: LedgerConfig, snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.owner != config.owner {
            return Err(SnapshotError::OwnerMismatch {
                snapshot: snapshot.owner,
                configured: config.owner,
            });
        }

        let mut producers = BTreeMap::new();
        for entry in snapshot.producers {
            if entry.producer.energy_price == 0 {
                return Err(SnapshotError::InvalidRow {
                    table: "producer",
                    key: entry.principal.to_string(),
                    reason: "energy price must be non-zero",
                });
            }
            if producers.contains_key(&entry.principal) {
                return Err(SnapshotError::DuplicateRow {
                    table: "producer",
                    key: entry.principal.to_string(),
                });
            }
            producers.insert(entry.principal, entry.producer);
        }

        let mut consumers = BTreeMap::new();
        for entry in snapshot.consumers {
            if consumers.contains_key(&entry.principal) {
                return Err(SnapshotError::DuplicateRow {
                    table: "consumer",
                    key: entry.principal.to_string(),
                });
            }
            consumers.insert(entry.principal, entry.consumer);
        }

        let mut purchases = BTreeMap::new();
        for entry in snapshot.purchases {
            if !consumers.contains_key(&entry.key.consumer)
                || !producers.contains_key(&entry.key.producer)
            {
                return Err(SnapshotError::InvalidRow {
                    table: "purchase",
                    key: entry.key.to_string(),
                    reason: "references an unregistered consumer or producer",
                });
            }
            if purchases.contains_key(&entry.key) {
                return Err(SnapshotError::DuplicateRow {
                    table: "purchase",
                    key: entry.key.to_string(),
                });
            }
            purchases.insert(entry.key, entry.record);
        }

        tracing::info!(
            owner = %config.owner,
            sequence = snapshot.sequence,
            producers = producers.len(),
            consumers = consumers.len(),
            purchases = purchases.len(),
            "ledger restored from snapshot"
        );

        Ok(Ledger {
            config,
            producers,
            consumers,
            purchases,
            receipts: Vec::new(),
            sequence: snapshot.sequence,
        })
    }
}
