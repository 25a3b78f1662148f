//! Market fixtures
//!
//! Principals are derived from a numeric seed so tests read the same as the
//! wallet labels used in scenario files (`wallet_1`, `wallet_2`, ...).

use gridshare_core::{Ledger, LedgerConfig, PrincipalId};

/// Principal that administers fixture ledgers.
pub const FIXTURE_OWNER: &str = "deployer";

/// Deterministic principal for `seed`, rendered as `wallet_<seed>`.
///
/// # Example
/// ```rust
/// use gridshare_testkit::principal;
///
/// assert_eq!(principal(1).as_str(), "wallet_1");
/// ```
pub fn principal(seed: u64) -> PrincipalId {
    PrincipalId::new(format!("wallet_{seed}"))
}

/// Owner principal of fixture ledgers.
pub fn owner() -> PrincipalId {
    PrincipalId::new(FIXTURE_OWNER)
}

/// Ledger configuration owned by [`owner`].
pub fn owner_config() -> LedgerConfig {
    LedgerConfig::new(FIXTURE_OWNER)
}

/// Empty ledger owned by [`owner`].
pub fn empty_ledger() -> Ledger {
    Ledger::new(owner_config())
}

/// Builder for a ledger with registered producers and consumers
///
/// Registrations are applied in the order they were added, so receipt
/// sequence numbers are predictable.
#[derive(Debug, Clone, Default)]
pub struct MarketFixture {
    producers: Vec<(PrincipalId, u64, u64)>,
    consumers: Vec<PrincipalId>,
    purchases: Vec<(PrincipalId, PrincipalId, u64)>,
}

impl MarketFixture {
    /// Start an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// The common two-party market: `wallet_1` lists 1000 units at 10,
    /// `wallet_2` is a consumer.
    pub fn standard() -> Self {
        Self::new()
            .with_producer(principal(1), 1000, 10)
            .with_consumer(principal(2))
    }

    /// Register `producer` listing `amount` units at `price`.
    pub fn with_producer(mut self, producer: PrincipalId, amount: u64, price: u64) -> Self {
        self.producers.push((producer, amount, price));
        self
    }

    /// Register `consumer`.
    pub fn with_consumer(mut self, consumer: PrincipalId) -> Self {
        self.consumers.push(consumer);
        self
    }

    /// Have `consumer` buy `units` from `producer` after registration.
    pub fn with_purchase(
        mut self,
        consumer: PrincipalId,
        producer: PrincipalId,
        units: u64,
    ) -> Self {
        self.purchases.push((consumer, producer, units));
        self
    }

    /// Build the ledger, panicking if any setup step is rejected.
    pub fn build(self) -> Ledger {
        let mut ledger = empty_ledger();
        for (producer, amount, price) in &self.producers {
            ledger
                .register_producer(producer, *amount, *price)
                .expect("fixture producer registration");
        }
        for consumer in &self.consumers {
            ledger
                .register_consumer(consumer)
                .expect("fixture consumer registration");
        }
        for (consumer, producer, units) in &self.purchases {
            ledger
                .buy_energy(consumer, producer, *units)
                .expect("fixture purchase");
        }
        ledger
    }
}
