//! Rejection taxonomy for ledger operations
//!
//! Every failure is a local business-rule rejection: nothing is retryable and
//! a rejected call leaves the ledger exactly as it was. Each variant maps to a
//! stable numeric code that hosts surface verbatim (`(err u107)`).

use crate::identifiers::PrincipalId;
use serde::{Deserialize, Serialize};

/// Caller is not the ledger owner.
pub const ERR_NOT_OWNER: u32 = 100;
/// Identity has no producer or consumer row.
pub const ERR_NOT_REGISTERED: u32 = 101;
/// Identity already has a row of that kind.
pub const ERR_ALREADY_REGISTERED: u32 = 102;
/// Purchase exceeds the producer's listed supply.
pub const ERR_INSUFFICIENT_SUPPLY: u32 = 103;
/// Zero units or zero price.
pub const ERR_INVALID_AMOUNT: u32 = 104;
/// Refund exceeds the producer's pending revenue.
pub const ERR_INSUFFICIENT_REVENUE: u32 = 105;
/// Stars outside `[1, 5]`.
pub const ERR_INVALID_RATING: u32 = 106;
/// No outstanding purchase from this consumer to this producer.
pub const ERR_NO_PURCHASE_HISTORY: u32 = 107;
/// Refund exceeds the outstanding purchased units.
pub const ERR_REFUND_EXCEEDS_PURCHASE: u32 = 108;
/// A quantity would leave the `u64` range.
pub const ERR_ARITHMETIC_OVERFLOW: u32 = 109;

/// Ledger operation rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LedgerError {
    /// Admin operation attempted by someone other than the owner
    #[error("caller {caller} is not the ledger owner")]
    NotOwner {
        /// Principal that attempted the call
        caller: PrincipalId,
    },

    /// Referenced identity has no row of the required kind
    #[error("{principal} is not a registered {role}")]
    NotRegistered {
        /// Missing principal
        principal: PrincipalId,
        /// `producer` or `consumer`
        role: Role,
    },

    /// Registration attempted twice
    #[error("{principal} is already registered as a {role}")]
    AlreadyRegistered {
        /// Principal that is already present
        principal: PrincipalId,
        /// `producer` or `consumer`
        role: Role,
    },

    /// Purchase larger than the listing
    #[error("insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply {
        /// Units requested
        requested: u64,
        /// Units listed
        available: u64,
    },

    /// Zero where a positive quantity is required
    #[error("invalid amount: {field} must be greater than zero")]
    InvalidAmount {
        /// Name of the offending parameter
        field: &'static str,
    },

    /// Refund larger than what the producer has not yet withdrawn
    #[error("insufficient revenue: refund {required}, pending {pending}")]
    InsufficientRevenue {
        /// Refund amount at the current price
        required: u64,
        /// Producer's pending revenue
        pending: u64,
    },

    /// Rating outside the accepted star range
    #[error("invalid rating {stars}: must be between 1 and 5")]
    InvalidRating {
        /// Stars supplied
        stars: u64,
    },

    /// Rating or lookup without a prior purchase between the pair
    #[error("{consumer} has no purchase history with {producer}")]
    NoPurchaseHistory {
        /// Consumer side of the pair
        consumer: PrincipalId,
        /// Producer side of the pair
        producer: PrincipalId,
    },

    /// Refund larger than the outstanding units
    #[error("refund of {requested} units exceeds outstanding purchase of {outstanding}")]
    RefundExceedsPurchase {
        /// Units the consumer asked to refund
        requested: u64,
        /// Units still refundable (0 when no record exists)
        outstanding: u64,
    },

    /// Unsigned arithmetic would overflow or underflow
    #[error("arithmetic overflow while computing {context}")]
    ArithmeticOverflow {
        /// Quantity being computed
        context: &'static str,
    },
}

/// Which table a registration error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Producer table
    Producer,
    /// Consumer table
    Consumer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Consumer => write!(f, "consumer"),
        }
    }
}

impl LedgerError {
    /// Stable numeric code surfaced to callers.
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::NotOwner { .. } => ERR_NOT_OWNER,
            LedgerError::NotRegistered { .. } => ERR_NOT_REGISTERED,
            LedgerError::AlreadyRegistered { .. } => ERR_ALREADY_REGISTERED,
            LedgerError::InsufficientSupply { .. } => ERR_INSUFFICIENT_SUPPLY,
            LedgerError::InvalidAmount { .. } => ERR_INVALID_AMOUNT,
            LedgerError::InsufficientRevenue { .. } => ERR_INSUFFICIENT_REVENUE,
            LedgerError::InvalidRating { .. } => ERR_INVALID_RATING,
            LedgerError::NoPurchaseHistory { .. } => ERR_NO_PURCHASE_HISTORY,
            LedgerError::RefundExceedsPurchase { .. } => ERR_REFUND_EXCEEDS_PURCHASE,
            LedgerError::ArithmeticOverflow { .. } => ERR_ARITHMETIC_OVERFLOW,
        }
    }

    /// Host rendering, e.g. `(err u107)`.
    pub fn render(&self) -> String {
        format!("(err u{})", self.code())
    }

    pub(crate) fn not_registered(principal: &PrincipalId, role: Role) -> Self {
        Self::NotRegistered {
            principal: principal.clone(),
            role,
        }
    }

    pub(crate) fn already_registered(principal: &PrincipalId, role: Role) -> Self {
        Self::AlreadyRegistered {
            principal: principal.clone(),
            role,
        }
    }

    pub(crate) fn overflow(context: &'static str) -> Self {
        Self::ArithmeticOverflow { context }
    }
}

/// Standard result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contractual_codes_are_fixed() {
        let owner_err = LedgerError::NotOwner {
            caller: PrincipalId::new("wallet_9"),
        };
        let history_err = LedgerError::NoPurchaseHistory {
            consumer: PrincipalId::new("wallet_2"),
            producer: PrincipalId::new("wallet_1"),
        };
        let refund_err = LedgerError::RefundExceedsPurchase {
            requested: 5,
            outstanding: 0,
        };
        assert_eq!(owner_err.code(), 100);
        assert_eq!(history_err.code(), 107);
        assert_eq!(refund_err.code(), 108);
        assert_eq!(history_err.render(), "(err u107)");
    }

    #[test]
    fn messages_carry_context() {
        let err = LedgerError::InsufficientSupply {
            requested: 200,
            available: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient supply: requested 200, available 100"
        );
        let err = LedgerError::not_registered(&PrincipalId::new("wallet_3"), Role::Consumer);
        assert_eq!(err.to_string(), "wallet_3 is not a registered consumer");
    }
}
