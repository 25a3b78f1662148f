//! Ledger state machine
//!
//! A flat set of guarded transitions over three tables. Every mutating
//! operation validates and computes all new rows first, then writes them and
//! appends one receipt. A rejection returns before the write phase, so state
//! is never partially updated.

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result, Role};
use crate::facts::{LedgerFact, Receipt};
use crate::identifiers::PrincipalId;
use crate::operation::{Operation, Outcome};
use crate::types::{
    Consumer, ConsumerInfo, Producer, ProducerInfo, PurchaseKey, PurchaseRecord, RatingSummary,
    MAX_STARS, MIN_STARS,
};
use std::collections::BTreeMap;

/// Energy marketplace ledger
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) producers: BTreeMap<PrincipalId, Producer>,
    pub(crate) consumers: BTreeMap<PrincipalId, Consumer>,
    pub(crate) purchases: BTreeMap<PurchaseKey, PurchaseRecord>,
    pub(crate) receipts: Vec<Receipt>,
    pub(crate) sequence: u64,
}

fn rejected<'a>(
    op: &'static str,
    caller: &'a PrincipalId,
) -> impl FnOnce(LedgerError) -> LedgerError + 'a {
    move |err| {
        tracing::debug!(
            op,
            caller = %caller,
            code = err.code(),
            error = %err,
            "operation rejected"
        );
        err
    }
}

impl Ledger {
    /// Empty ledger administered by `config.owner`.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            producers: BTreeMap::new(),
            consumers: BTreeMap::new(),
            purchases: BTreeMap::new(),
            receipts: Vec::new(),
            sequence: 0,
        }
    }

    /// Principal authorized for admin operations.
    pub fn owner(&self) -> &PrincipalId {
        &self.config.owner
    }

    /// Configuration the ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Sequence number of the last committed mutation (0 when none).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Receipts committed since construction or restore.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Producer row, if registered.
    pub fn producer(&self, producer: &PrincipalId) -> Option<&Producer> {
        self.producers.get(producer)
    }

    /// Consumer row, if registered.
    pub fn consumer(&self, consumer: &PrincipalId) -> Option<&Consumer> {
        self.consumers.get(consumer)
    }

    /// Purchase record for the pair, if any purchase ever happened.
    pub fn purchase(
        &self,
        consumer: &PrincipalId,
        producer: &PrincipalId,
    ) -> Option<&PurchaseRecord> {
        self.purchases
            .get(&PurchaseKey::new(consumer.clone(), producer.clone()))
    }

    /// Number of registered producers.
    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Apply an operation on behalf of `caller`.
    pub fn apply(&mut self, caller: &PrincipalId, operation: &Operation) -> Result<Outcome> {
        match operation {
            Operation::RegisterProducer { amount, price } => self
                .register_producer(caller, *amount, *price)
                .map(|()| Outcome::Ack),
            Operation::RegisterConsumer => self.register_consumer(caller).map(|()| Outcome::Ack),
            Operation::BuyEnergy { producer, units } => self
                .buy_energy(caller, producer, *units)
                .map(|()| Outcome::Ack),
            Operation::RateProducer { producer, stars } => self
                .rate_producer(caller, producer, *stars)
                .map(|()| Outcome::Ack),
            Operation::RequestRefund { producer, units } => self
                .request_refund(caller, producer, *units)
                .map(|()| Outcome::Ack),
            Operation::SetEnergyPrice { producer, price } => self
                .set_energy_price(caller, producer, *price)
                .map(|()| Outcome::Ack),
            Operation::WithdrawRevenue => self.withdraw_revenue(caller).map(Outcome::Amount),
            Operation::GetProducerInfo { producer } => {
                self.producer_info(producer).map(Outcome::ProducerInfo)
            }
            Operation::GetConsumerInfo { consumer } => {
                self.consumer_info(consumer).map(Outcome::ConsumerInfo)
            }
            Operation::GetProducerRating { producer } => {
                self.producer_rating(producer).map(Outcome::Rating)
            }
            Operation::GetPurchaseRecord { consumer, producer } => {
                self.purchase_record(consumer, producer).map(Outcome::Purchase)
            }
            Operation::GetPendingRevenue { producer } => {
                self.pending_revenue(producer).map(Outcome::Amount)
            }
        }
    }

    /// `register-producer`: list `energy_amount` units at `price` per unit.
    pub fn register_producer(
        &mut self,
        caller: &PrincipalId,
        energy_amount: u64,
        price: u64,
    ) -> Result<()> {
        if self.producers.contains_key(caller) {
            return Err(LedgerError::already_registered(caller, Role::Producer))
                .map_err(rejected("register-producer", caller));
        }
        if price == 0 {
            return Err(LedgerError::InvalidAmount { field: "price" })
                .map_err(rejected("register-producer", caller));
        }

        self.producers
            .insert(caller.clone(), Producer::new(energy_amount, price));
        let sequence = self.commit(
            caller,
            LedgerFact::ProducerRegistered {
                producer: caller.clone(),
                energy_amount,
                price,
            },
        );
        tracing::info!(sequence, producer = %caller, energy_amount, price, "producer registered");
        Ok(())
    }

    /// `register-consumer`.
    pub fn register_consumer(&mut self, caller: &PrincipalId) -> Result<()> {
        if self.consumers.contains_key(caller) {
            return Err(LedgerError::already_registered(caller, Role::Consumer))
                .map_err(rejected("register-consumer", caller));
        }

        self.consumers.insert(caller.clone(), Consumer::default());
        let sequence = self.commit(
            caller,
            LedgerFact::ConsumerRegistered {
                consumer: caller.clone(),
            },
        );
        tracing::info!(sequence, consumer = %caller, "consumer registered");
        Ok(())
    }

    /// `buy-energy`: `caller` buys `units` from `producer` at its current price.
    pub fn buy_energy(
        &mut self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        units: u64,
    ) -> Result<()> {
        let (buyer, seller, record, cost) = self
            .plan_purchase(caller, producer, units)
            .map_err(rejected("buy-energy", caller))?;

        self.consumers.insert(caller.clone(), buyer);
        self.producers.insert(producer.clone(), seller);
        self.purchases
            .insert(PurchaseKey::new(caller.clone(), producer.clone()), record);
        let sequence = self.commit(
            caller,
            LedgerFact::EnergyPurchased {
                consumer: caller.clone(),
                producer: producer.clone(),
                units,
                cost,
            },
        );
        tracing::info!(
            sequence,
            consumer = %caller,
            producer = %producer,
            units,
            cost,
            "energy purchased"
        );
        Ok(())
    }

    fn plan_purchase(
        &self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        units: u64,
    ) -> Result<(Consumer, Producer, PurchaseRecord, u64)> {
        let mut buyer = *self
            .consumers
            .get(caller)
            .ok_or_else(|| LedgerError::not_registered(caller, Role::Consumer))?;
        let mut seller = *self
            .producers
            .get(producer)
            .ok_or_else(|| LedgerError::not_registered(producer, Role::Producer))?;
        if units == 0 {
            return Err(LedgerError::InvalidAmount { field: "units" });
        }
        if units > seller.energy_available {
            return Err(LedgerError::InsufficientSupply {
                requested: units,
                available: seller.energy_available,
            });
        }

        let cost = units
            .checked_mul(seller.energy_price)
            .ok_or_else(|| LedgerError::overflow("purchase cost"))?;
        seller.energy_available -= units;
        seller.pending_revenue = seller
            .pending_revenue
            .checked_add(cost)
            .ok_or_else(|| LedgerError::overflow("pending revenue"))?;
        buyer.energy_consumed = buyer
            .energy_consumed
            .checked_add(units)
            .ok_or_else(|| LedgerError::overflow("energy consumed"))?;
        buyer.total_spent = buyer
            .total_spent
            .checked_add(cost)
            .ok_or_else(|| LedgerError::overflow("total spent"))?;

        let mut record = self
            .purchases
            .get(&PurchaseKey::new(caller.clone(), producer.clone()))
            .copied()
            .unwrap_or_default();
        record.units_bought = record
            .units_bought
            .checked_add(units)
            .ok_or_else(|| LedgerError::overflow("units bought"))?;
        record.amount_paid = record
            .amount_paid
            .checked_add(cost)
            .ok_or_else(|| LedgerError::overflow("amount paid"))?;

        Ok((buyer, seller, record, cost))
    }

    /// `rate-producer`: requires an outstanding purchase from `caller` to `producer`.
    pub fn rate_producer(
        &mut self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        stars: u64,
    ) -> Result<()> {
        let rated = self
            .plan_rating(caller, producer, stars)
            .map_err(rejected("rate-producer", caller))?;

        self.producers.insert(producer.clone(), rated);
        let sequence = self.commit(
            caller,
            LedgerFact::ProducerRated {
                consumer: caller.clone(),
                producer: producer.clone(),
                stars,
            },
        );
        tracing::info!(
            sequence,
            consumer = %caller,
            producer = %producer,
            stars,
            "producer rated"
        );
        Ok(())
    }

    fn plan_rating(
        &self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        stars: u64,
    ) -> Result<Producer> {
        // History is checked before the star range: a rating from a
        // non-buyer is always 107.
        let has_history = self
            .purchase(caller, producer)
            .is_some_and(PurchaseRecord::has_units);
        if !has_history {
            return Err(LedgerError::NoPurchaseHistory {
                consumer: caller.clone(),
                producer: producer.clone(),
            });
        }
        if !(MIN_STARS..=MAX_STARS).contains(&stars) {
            return Err(LedgerError::InvalidRating { stars });
        }

        let mut rated = *self
            .producers
            .get(producer)
            .ok_or_else(|| LedgerError::not_registered(producer, Role::Producer))?;
        rated.rating_sum = rated
            .rating_sum
            .checked_add(stars)
            .ok_or_else(|| LedgerError::overflow("rating sum"))?;
        rated.rating_count = rated
            .rating_count
            .checked_add(1)
            .ok_or_else(|| LedgerError::overflow("rating count"))?;
        Ok(rated)
    }

    /// `request-refund`: return `units` to `producer` at its current price.
    ///
    /// The refund uses the producer's price at refund time, not the price paid,
    /// so a reprice between purchase and refund changes the amount returned.
    pub fn request_refund(
        &mut self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        units: u64,
    ) -> Result<()> {
        let (buyer, seller, record, refund_amount) = self
            .plan_refund(caller, producer, units)
            .map_err(rejected("request-refund", caller))?;

        self.consumers.insert(caller.clone(), buyer);
        self.producers.insert(producer.clone(), seller);
        self.purchases
            .insert(PurchaseKey::new(caller.clone(), producer.clone()), record);
        let sequence = self.commit(
            caller,
            LedgerFact::RefundIssued {
                consumer: caller.clone(),
                producer: producer.clone(),
                units,
                refund_amount,
            },
        );
        tracing::info!(
            sequence,
            consumer = %caller,
            producer = %producer,
            units,
            refund_amount,
            "refund issued"
        );
        Ok(())
    }

    fn plan_refund(
        &self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        units: u64,
    ) -> Result<(Consumer, Producer, PurchaseRecord, u64)> {
        let mut record = match self.purchase(caller, producer) {
            Some(record) if record.units_bought >= units => *record,
            other => {
                return Err(LedgerError::RefundExceedsPurchase {
                    requested: units,
                    outstanding: other.map_or(0, |record| record.units_bought),
                })
            }
        };
        let mut seller = *self
            .producers
            .get(producer)
            .ok_or_else(|| LedgerError::not_registered(producer, Role::Producer))?;
        let mut buyer = *self
            .consumers
            .get(caller)
            .ok_or_else(|| LedgerError::not_registered(caller, Role::Consumer))?;

        let refund_amount = units
            .checked_mul(seller.energy_price)
            .ok_or_else(|| LedgerError::overflow("refund amount"))?;
        if seller.pending_revenue < refund_amount {
            return Err(LedgerError::InsufficientRevenue {
                required: refund_amount,
                pending: seller.pending_revenue,
            });
        }

        seller.energy_available = seller
            .energy_available
            .checked_add(units)
            .ok_or_else(|| LedgerError::overflow("energy available"))?;
        seller.pending_revenue -= refund_amount;

        let released = record.proportional_amount(units);
        record.units_bought -= units;
        record.amount_paid -= released;

        buyer.energy_consumed = buyer
            .energy_consumed
            .checked_sub(units)
            .ok_or_else(|| LedgerError::overflow("energy consumed"))?;
        // A price increase can make the refund exceed what was recorded as spent.
        buyer.total_spent = buyer.total_spent.saturating_sub(refund_amount);

        Ok((buyer, seller, record, refund_amount))
    }

    /// `set-energy-price`: owner-only reprice of `producer`.
    pub fn set_energy_price(
        &mut self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        new_price: u64,
    ) -> Result<()> {
        let old_price = self
            .plan_reprice(caller, producer, new_price)
            .map_err(rejected("set-energy-price", caller))?;

        if let Some(row) = self.producers.get_mut(producer) {
            row.energy_price = new_price;
        }
        let sequence = self.commit(
            caller,
            LedgerFact::PriceUpdated {
                producer: producer.clone(),
                old_price,
                new_price,
            },
        );
        tracing::info!(
            sequence,
            producer = %producer,
            old_price,
            new_price,
            "energy price updated"
        );
        Ok(())
    }

    fn plan_reprice(
        &self,
        caller: &PrincipalId,
        producer: &PrincipalId,
        new_price: u64,
    ) -> Result<u64> {
        if caller != &self.config.owner {
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
            });
        }
        let row = self
            .producers
            .get(producer)
            .ok_or_else(|| LedgerError::not_registered(producer, Role::Producer))?;
        if new_price == 0 {
            return Err(LedgerError::InvalidAmount { field: "price" });
        }
        Ok(row.energy_price)
    }

    /// `withdraw-revenue`: zero the caller's pending revenue and return it.
    pub fn withdraw_revenue(&mut self, caller: &PrincipalId) -> Result<u64> {
        let row = self
            .producers
            .get_mut(caller)
            .ok_or_else(|| LedgerError::not_registered(caller, Role::Producer))
            .map_err(rejected("withdraw-revenue", caller))?;
        let amount = std::mem::take(&mut row.pending_revenue);

        let sequence = self.commit(
            caller,
            LedgerFact::RevenueWithdrawn {
                producer: caller.clone(),
                amount,
            },
        );
        tracing::info!(sequence, producer = %caller, amount, "revenue withdrawn");
        Ok(amount)
    }

    /// `get-producer-info`.
    pub fn producer_info(&self, producer: &PrincipalId) -> Result<ProducerInfo> {
        self.producer_row(producer).map(Producer::info)
    }

    /// `get-consumer-info`.
    pub fn consumer_info(&self, consumer: &PrincipalId) -> Result<ConsumerInfo> {
        self.consumers
            .get(consumer)
            .map(Consumer::info)
            .ok_or_else(|| LedgerError::not_registered(consumer, Role::Consumer))
    }

    /// `get-producer-rating`.
    pub fn producer_rating(&self, producer: &PrincipalId) -> Result<RatingSummary> {
        self.producer_row(producer).map(Producer::rating)
    }

    /// `get-pending-revenue`.
    pub fn pending_revenue(&self, producer: &PrincipalId) -> Result<u64> {
        self.producer_row(producer).map(|row| row.pending_revenue)
    }

    /// `get-purchase-record`: outstanding units and amount for the pair.
    pub fn purchase_record(
        &self,
        consumer: &PrincipalId,
        producer: &PrincipalId,
    ) -> Result<PurchaseRecord> {
        self.purchase(consumer, producer)
            .copied()
            .ok_or_else(|| LedgerError::NoPurchaseHistory {
                consumer: consumer.clone(),
                producer: producer.clone(),
            })
    }

    fn producer_row(&self, producer: &PrincipalId) -> Result<&Producer> {
        self.producers
            .get(producer)
            .ok_or_else(|| LedgerError::not_registered(producer, Role::Producer))
    }

    fn commit(&mut self, caller: &PrincipalId, fact: LedgerFact) -> u64 {
        self.sequence = self.sequence.saturating_add(1);
        self.receipts.push(Receipt {
            sequence: self.sequence,
            caller: caller.clone(),
            fact,
        });
        self.sequence
    }
}
