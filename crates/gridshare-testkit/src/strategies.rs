//! Property test strategies for ledger operations
//!
//! Principals are drawn from a small pool so generated sequences collide on
//! the same producers and consumers often enough to reach the interesting
//! guards (duplicate registration, supply exhaustion, refunds).

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use crate::fixtures::{owner, principal};
use gridshare_core::{Operation, PrincipalId};

/// Number of wallets in the generated principal pool.
pub const PRINCIPAL_POOL: u64 = 5;

/// Strategy for a wallet principal from the shared pool.
///
/// # Example
///
/// ```rust
/// use gridshare_testkit::strategies::arb_principal;
/// use proptest::prelude::*;
///
/// proptest! {
///     #[test]
///     fn principals_are_wallets(id in arb_principal()) {
///         assert!(id.as_str().starts_with("wallet_"));
///     }
/// }
/// ```
pub fn arb_principal() -> impl Strategy<Value = PrincipalId> {
    (1..=PRINCIPAL_POOL).prop_map(principal)
}

/// Strategy for a caller: usually a wallet, sometimes the owner.
pub fn arb_caller() -> impl Strategy<Value = PrincipalId> {
    prop_oneof![
        6 => arb_principal(),
        1 => Just(owner()),
    ]
}

/// Unit price, occasionally zero.
pub fn arb_price() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        9 => 1u64..=50,
    ]
}

/// Unit quantity for purchases and refunds, occasionally zero.
pub fn arb_units() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        9 => 1u64..=400,
    ]
}

/// Star rating including values just outside `[1, 5]`.
pub fn arb_stars() -> impl Strategy<Value = u64> {
    0u64..=6
}

/// Strategy for a mutating ledger operation.
pub fn arb_mutation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (0u64..=2000, arb_price())
            .prop_map(|(amount, price)| Operation::RegisterProducer { amount, price }),
        3 => Just(Operation::RegisterConsumer),
        6 => (arb_principal(), arb_units())
            .prop_map(|(producer, units)| Operation::BuyEnergy { producer, units }),
        3 => (arb_principal(), arb_stars())
            .prop_map(|(producer, stars)| Operation::RateProducer { producer, stars }),
        4 => (arb_principal(), arb_units())
            .prop_map(|(producer, units)| Operation::RequestRefund { producer, units }),
        2 => (arb_principal(), arb_price())
            .prop_map(|(producer, price)| Operation::SetEnergyPrice { producer, price }),
        2 => Just(Operation::WithdrawRevenue),
    ]
}

/// Strategy for a read-only ledger operation.
pub fn arb_query() -> impl Strategy<Value = Operation> {
    prop_oneof![
        arb_principal().prop_map(|producer| Operation::GetProducerInfo { producer }),
        arb_principal().prop_map(|consumer| Operation::GetConsumerInfo { consumer }),
        arb_principal().prop_map(|producer| Operation::GetProducerRating { producer }),
        (arb_principal(), arb_principal()).prop_map(|(consumer, producer)| {
            Operation::GetPurchaseRecord { consumer, producer }
        }),
        arb_principal().prop_map(|producer| Operation::GetPendingRevenue { producer }),
    ]
}

/// Strategy for any ledger operation, mostly mutations.
pub fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        8 => arb_mutation(),
        1 => arb_query(),
    ]
}

/// Strategy for a `(caller, operation)` call.
pub fn arb_call() -> impl Strategy<Value = (PrincipalId, Operation)> {
    (arb_caller(), arb_operation())
}

/// Strategy for a sequence of up to `max_len` calls.
pub fn arb_calls(max_len: usize) -> impl Strategy<Value = Vec<(PrincipalId, Operation)>> {
    proptest::collection::vec(arb_call(), 0..=max_len)
}
