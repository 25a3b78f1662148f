//! Ledger rows and read views
//!
//! Rows hold scalar aggregates only. A purchase record names its consumer and
//! producer by identity; no row holds a reference into another table.

use crate::identifiers::PrincipalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted rating.
pub const MIN_STARS: u64 = 1;
/// Highest accepted rating.
pub const MAX_STARS: u64 = 5;

/// Producer row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    /// Units currently for sale
    pub energy_available: u64,
    /// Price per unit; never zero once registered
    pub energy_price: u64,
    /// Accrued revenue awaiting withdrawal
    pub pending_revenue: u64,
    /// Sum of all stars received
    pub rating_sum: u64,
    /// Number of ratings received
    pub rating_count: u64,
}

impl Producer {
    /// Fresh producer listing `energy_available` units at `energy_price`.
    pub fn new(energy_available: u64, energy_price: u64) -> Self {
        Self {
            energy_available,
            energy_price,
            pending_revenue: 0,
            rating_sum: 0,
            rating_count: 0,
        }
    }

    /// Public listing view.
    pub fn info(&self) -> ProducerInfo {
        ProducerInfo {
            energy_available: self.energy_available,
            energy_price: self.energy_price,
        }
    }

    /// Aggregate rating view.
    pub fn rating(&self) -> RatingSummary {
        RatingSummary {
            rating_sum: self.rating_sum,
            rating_count: self.rating_count,
        }
    }
}

/// Consumer row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    /// Units bought, net of refunds
    pub energy_consumed: u64,
    /// Amount paid, net of refunds
    pub total_spent: u64,
}

impl Consumer {
    /// Public view of the consumer.
    pub fn info(&self) -> ConsumerInfo {
        ConsumerInfo {
            energy_consumed: self.energy_consumed,
            total_spent: self.total_spent,
        }
    }
}

/// Composite key of a purchase record: `(consumer, producer)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PurchaseKey {
    /// Buying principal
    pub consumer: PrincipalId,
    /// Selling principal
    pub producer: PrincipalId,
}

impl PurchaseKey {
    /// Create a key for the pair.
    pub fn new(consumer: PrincipalId, producer: PrincipalId) -> Self {
        Self { consumer, producer }
    }
}

impl fmt::Display for PurchaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.consumer, self.producer)
    }
}

/// Outstanding refundable quantity for a consumer/producer pair
///
/// Purchases add to both fields; refunds subtract. The row is never removed,
/// so a fully refunded pair keeps a record with zero units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Units still refundable
    pub units_bought: u64,
    /// Amount attributed to those units
    pub amount_paid: u64,
}

impl PurchaseRecord {
    /// Whether any units are outstanding (required before rating).
    pub fn has_units(&self) -> bool {
        self.units_bought > 0
    }

    /// Share of `amount_paid` attributable to `units` of the outstanding units.
    ///
    /// Refunding every outstanding unit releases the whole remainder so no
    /// rounding dust is left behind.
    pub fn proportional_amount(&self, units: u64) -> u64 {
        if units >= self.units_bought {
            return self.amount_paid;
        }
        let share =
            u128::from(self.amount_paid) * u128::from(units) / u128::from(self.units_bought);
        // share <= amount_paid because units < units_bought
        u64::try_from(share).unwrap_or(self.amount_paid)
    }
}

/// Listing returned by `get-producer-info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerInfo {
    /// Units currently for sale
    pub energy_available: u64,
    /// Price per unit
    pub energy_price: u64,
}

impl fmt::Display for ProducerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{energy-available: u{}, energy-price: u{}}}",
            self.energy_available, self.energy_price
        )
    }
}

/// View returned by `get-consumer-info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerInfo {
    /// Units bought, net of refunds
    pub energy_consumed: u64,
    /// Amount paid, net of refunds
    pub total_spent: u64,
}

impl fmt::Display for ConsumerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{energy-consumed: u{}, total-spent: u{}}}",
            self.energy_consumed, self.total_spent
        )
    }
}

/// Aggregate rating of a producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Sum of all stars
    pub rating_sum: u64,
    /// Number of ratings
    pub rating_count: u64,
}

impl RatingSummary {
    /// Mean stars, or `None` before the first rating.
    pub fn average(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }
}

impl fmt::Display for RatingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{rating-sum: u{}, rating-count: u{}}}",
            self.rating_sum, self.rating_count
        )
    }
}
