//! # Gridshare Testkit
//!
//! Shared test infrastructure for the gridshare workspace:
//!
//! - [`fixtures`]: deterministic principals and a pre-populated market builder
//! - [`strategies`]: proptest strategies for principals and operations
//! - [`assertions`]: rejection assertions keyed by host error code
//!
//! Use this crate from integration tests (`tests/`) only. A unit test inside
//! `gridshare-core` would see two copies of the core types.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod assertions;
pub mod fixtures;
pub mod strategies;

pub use fixtures::*;
pub use strategies::*;
