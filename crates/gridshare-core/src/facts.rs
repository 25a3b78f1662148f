//! Facts recorded for committed mutations.
//!
//! Each successful mutating operation appends exactly one [`Receipt`]. Reads
//! and rejected calls append nothing, so the receipt sequence counts commits.

use crate::identifiers::PrincipalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a committed operation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerFact {
    /// A producer listed energy
    ProducerRegistered {
        /// New producer
        producer: PrincipalId,
        /// Units listed
        energy_amount: u64,
        /// Initial unit price
        price: u64,
    },
    /// A consumer joined
    ConsumerRegistered {
        /// New consumer
        consumer: PrincipalId,
    },
    /// Units changed hands
    EnergyPurchased {
        /// Buyer
        consumer: PrincipalId,
        /// Seller
        producer: PrincipalId,
        /// Units bought
        units: u64,
        /// `units * price` at purchase time
        cost: u64,
    },
    /// A consumer rated a producer
    ProducerRated {
        /// Rater
        consumer: PrincipalId,
        /// Rated producer
        producer: PrincipalId,
        /// Stars given
        stars: u64,
    },
    /// Units were returned to a producer
    RefundIssued {
        /// Refunded consumer
        consumer: PrincipalId,
        /// Producer whose revenue was debited
        producer: PrincipalId,
        /// Units returned to supply
        units: u64,
        /// `units * price` at refund time
        refund_amount: u64,
    },
    /// The owner repriced a producer
    PriceUpdated {
        /// Repriced producer
        producer: PrincipalId,
        /// Price before the update
        old_price: u64,
        /// Price after the update
        new_price: u64,
    },
    /// A producer withdrew accrued revenue
    RevenueWithdrawn {
        /// Withdrawing producer
        producer: PrincipalId,
        /// Amount withdrawn (may be zero)
        amount: u64,
    },
}

impl LedgerFact {
    /// Short operation name, matching the host operation it came from.
    pub fn operation_name(&self) -> &'static str {
        match self {
            LedgerFact::ProducerRegistered { .. } => "register-producer",
            LedgerFact::ConsumerRegistered { .. } => "register-consumer",
            LedgerFact::EnergyPurchased { .. } => "buy-energy",
            LedgerFact::ProducerRated { .. } => "rate-producer",
            LedgerFact::RefundIssued { .. } => "request-refund",
            LedgerFact::PriceUpdated { .. } => "set-energy-price",
            LedgerFact::RevenueWithdrawn { .. } => "withdraw-revenue",
        }
    }
}

/// Journal entry for one committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position in the commit order, starting at 1
    pub sequence: u64,
    /// Principal that signed the operation
    pub caller: PrincipalId,
    /// What changed
    pub fact: LedgerFact,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} by {}",
            self.sequence,
            self.fact.operation_name(),
            self.caller
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn receipt_serializes_with_tagged_fact() {
        let receipt = Receipt {
            sequence: 3,
            caller: PrincipalId::new("wallet_2"),
            fact: LedgerFact::EnergyPurchased {
                consumer: PrincipalId::new("wallet_2"),
                producer: PrincipalId::new("wallet_1"),
                units: 100,
                cost: 1000,
            },
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["fact"]["kind"], "energy_purchased");
        assert_eq!(value["fact"]["cost"], 1000);
        assert_eq!(receipt.to_string(), "#3 buy-energy by wallet_2");
    }
}
