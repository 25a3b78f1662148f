//! Operations and outcomes as data
//!
//! Hosts that replay transactions (the CLI scenario runner, tests) describe
//! each call as an [`Operation`] and hand it to [`Ledger::apply`] together with
//! the calling principal.
//!
//! [`Ledger::apply`]: crate::Ledger::apply

use crate::identifiers::PrincipalId;
use crate::types::{ConsumerInfo, ProducerInfo, PurchaseRecord, RatingSummary};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger call, tagged by its host operation name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    /// `register-producer(amount, price)`
    RegisterProducer {
        /// Units to list
        amount: u64,
        /// Price per unit
        price: u64,
    },
    /// `register-consumer()`
    RegisterConsumer,
    /// `buy-energy(producer, units)`
    BuyEnergy {
        /// Seller
        producer: PrincipalId,
        /// Units to buy
        units: u64,
    },
    /// `rate-producer(producer, stars)`
    RateProducer {
        /// Rated producer
        producer: PrincipalId,
        /// Stars in `[1, 5]`
        stars: u64,
    },
    /// `request-refund(producer, units)`
    RequestRefund {
        /// Producer to refund from
        producer: PrincipalId,
        /// Units to return
        units: u64,
    },
    /// `set-energy-price(producer, price)`, owner only
    SetEnergyPrice {
        /// Producer to reprice
        producer: PrincipalId,
        /// New unit price
        price: u64,
    },
    /// `withdraw-revenue()`
    WithdrawRevenue,
    /// `get-producer-info(producer)`
    GetProducerInfo {
        /// Producer to read
        producer: PrincipalId,
    },
    /// `get-consumer-info(consumer)`
    GetConsumerInfo {
        /// Consumer to read
        consumer: PrincipalId,
    },
    /// `get-producer-rating(producer)`
    GetProducerRating {
        /// Producer to read
        producer: PrincipalId,
    },
    /// `get-purchase-record(consumer, producer)`
    GetPurchaseRecord {
        /// Consumer side of the pair
        consumer: PrincipalId,
        /// Producer side of the pair
        producer: PrincipalId,
    },
    /// `get-pending-revenue(producer)`
    GetPendingRevenue {
        /// Producer to read
        producer: PrincipalId,
    },
}

impl Operation {
    /// Host operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::RegisterProducer { .. } => "register-producer",
            Operation::RegisterConsumer => "register-consumer",
            Operation::BuyEnergy { .. } => "buy-energy",
            Operation::RateProducer { .. } => "rate-producer",
            Operation::RequestRefund { .. } => "request-refund",
            Operation::SetEnergyPrice { .. } => "set-energy-price",
            Operation::WithdrawRevenue => "withdraw-revenue",
            Operation::GetProducerInfo { .. } => "get-producer-info",
            Operation::GetConsumerInfo { .. } => "get-consumer-info",
            Operation::GetProducerRating { .. } => "get-producer-rating",
            Operation::GetPurchaseRecord { .. } => "get-purchase-record",
            Operation::GetPendingRevenue { .. } => "get-pending-revenue",
        }
    }

    /// Whether the operation only reads state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::GetProducerInfo { .. }
                | Operation::GetConsumerInfo { .. }
                | Operation::GetProducerRating { .. }
                | Operation::GetPurchaseRecord { .. }
                | Operation::GetPendingRevenue { .. }
        )
    }
}

/// Successful result of an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Mutation committed (`(ok true)`)
    Ack,
    /// Amount returned by a withdrawal or revenue read
    Amount(u64),
    /// Producer listing
    ProducerInfo(ProducerInfo),
    /// Consumer totals
    ConsumerInfo(ConsumerInfo),
    /// Producer rating aggregate
    Rating(RatingSummary),
    /// Outstanding purchase between a pair
    Purchase(PurchaseRecord),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ack => write!(f, "(ok true)"),
            Outcome::Amount(amount) => write!(f, "(ok u{amount})"),
            Outcome::ProducerInfo(info) => write!(f, "(ok {info})"),
            Outcome::ConsumerInfo(info) => write!(f, "(ok {info})"),
            Outcome::Rating(summary) => write!(f, "(ok {summary})"),
            Outcome::Purchase(record) => write!(
                f,
                "(ok {{units-bought: u{}, amount-paid: u{}}})",
                record.units_bought, record.amount_paid
            ),
        }
    }
}
