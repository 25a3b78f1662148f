//! # Gridshare Core
//!
//! Ledger state machine for a peer-to-peer energy marketplace. Producers list
//! energy at a unit price, consumers buy units, producers accrue revenue and
//! ratings, and consumers may request partial refunds.
//!
//! The ledger is a plain owned value. The host serializes calls, so every
//! operation takes `&mut self`, runs to completion, and either commits fully or
//! returns a [`LedgerError`] with state untouched.
//!
//! ## Modules
//!
//! - [`identifiers`]: principal identities
//! - [`types`]: producer, consumer, and purchase rows plus read views
//! - [`errors`]: rejection taxonomy with stable numeric codes
//! - [`config`]: ledger configuration (owner identity)
//! - [`facts`]: receipts appended for each committed mutation
//! - [`operation`]: operations and outcomes as data
//! - [`ledger`]: the state machine
//! - [`snapshot`]: serializable state for host persistence

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod facts;
pub mod identifiers;
pub mod ledger;
pub mod operation;
pub mod snapshot;
pub mod types;

pub use config::{load_toml, ConfigError, LedgerConfig, OWNER_ENV_VAR};
pub use errors::{LedgerError, Result, Role};
pub use facts::{LedgerFact, Receipt};
pub use identifiers::PrincipalId;
pub use ledger::Ledger;
pub use operation::{Operation, Outcome};
pub use snapshot::{
    ConsumerEntry, LedgerSnapshot, ProducerEntry, PurchaseEntry, SnapshotError,
};
pub use types::{
    Consumer, ConsumerInfo, Producer, ProducerInfo, PurchaseKey, PurchaseRecord, RatingSummary,
    MAX_STARS, MIN_STARS,
};
