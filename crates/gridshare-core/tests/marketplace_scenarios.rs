//! End-to-end marketplace behavior through the public ledger API.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use gridshare_core::{
    ConsumerInfo, Ledger, LedgerError, LedgerFact, LedgerSnapshot, Operation, Outcome,
    ProducerInfo, PurchaseRecord, Role,
};
use gridshare_testkit::{
    assert_rejected, assert_state_unchanged, empty_ledger, owner, owner_config, principal,
    MarketFixture,
};

#[test]
fn double_registration_is_rejected_without_mutation() {
    let mut ledger = MarketFixture::standard().build();

    let err = assert_state_unchanged!(ledger, {
        ledger.register_producer(&principal(1), 5, 5).unwrap_err()
    });
    assert_matches!(
        err,
        LedgerError::AlreadyRegistered { role: Role::Producer, .. }
    );

    let err = assert_state_unchanged!(ledger, {
        ledger.register_consumer(&principal(2)).unwrap_err()
    });
    assert_eq!(err.code(), 102);
}

#[test]
fn registered_listing_reads_back() {
    let mut ledger = empty_ledger();
    ledger.register_producer(&principal(1), 1000, 10).unwrap();
    assert_eq!(
        ledger.producer_info(&principal(1)).unwrap(),
        ProducerInfo {
            energy_available: 1000,
            energy_price: 10
        }
    );
}

#[test]
fn purchase_moves_supply_and_revenue_exactly() {
    let mut ledger = MarketFixture::standard().build();
    let before = *ledger.producer(&principal(1)).unwrap();

    ledger.buy_energy(&principal(2), &principal(1), 100).unwrap();

    let after = *ledger.producer(&principal(1)).unwrap();
    assert_eq!(after.energy_available, before.energy_available - 100);
    assert_eq!(after.pending_revenue, before.pending_revenue + 100 * before.energy_price);
}

#[test]
fn zero_unit_purchase_is_rejected_without_mutation() {
    let mut ledger = MarketFixture::standard().build();
    let err = assert_state_unchanged!(ledger, {
        ledger.buy_energy(&principal(2), &principal(1), 0).unwrap_err()
    });
    assert_matches!(err, LedgerError::InvalidAmount { field: "units" });
}

#[test]
fn purchase_beyond_supply_is_rejected() {
    let mut ledger = MarketFixture::standard().build();
    let err = assert_state_unchanged!(ledger, {
        ledger.buy_energy(&principal(2), &principal(1), 1001).unwrap_err()
    });
    assert_matches!(
        err,
        LedgerError::InsufficientSupply {
            requested: 1001,
            available: 1000
        }
    );
}

#[test]
fn rating_without_purchase_is_always_107() {
    let mut ledger = MarketFixture::standard().build();
    for stars in 0..=6 {
        assert_state_unchanged!(ledger, {
            assert_rejected!(ledger.rate_producer(&principal(2), &principal(1), stars), 107);
        });
    }
    // Unregistered parties are also reported as missing history.
    assert_rejected!(ledger.rate_producer(&principal(9), &principal(8), 3), 107);
}

#[test]
fn over_refund_is_always_108() {
    let mut ledger = MarketFixture::standard()
        .with_purchase(principal(2), principal(1), 100)
        .build();
    for units in [101, 500, u64::MAX] {
        let err = assert_state_unchanged!(ledger, {
            ledger.request_refund(&principal(2), &principal(1), units).unwrap_err()
        });
        assert_matches!(err, LedgerError::RefundExceedsPurchase { outstanding: 100, .. });
    }
    assert_rejected!(ledger.request_refund(&principal(3), &principal(1), 1), 108);
}

#[test]
fn buy_then_refund_restores_supply_and_revenue() {
    let mut ledger = MarketFixture::standard().build();
    let before = *ledger.producer(&principal(1)).unwrap();

    ledger.buy_energy(&principal(2), &principal(1), 250).unwrap();
    ledger.request_refund(&principal(2), &principal(1), 250).unwrap();

    let after = *ledger.producer(&principal(1)).unwrap();
    assert_eq!(after.energy_available, before.energy_available);
    assert_eq!(after.pending_revenue, before.pending_revenue);
    assert_eq!(
        ledger.purchase_record(&principal(2), &principal(1)).unwrap(),
        PurchaseRecord::default()
    );
}

#[test]
fn refund_after_reprice_uses_current_price() {
    let mut ledger = MarketFixture::standard()
        .with_purchase(principal(2), principal(1), 100)
        .build();
    ledger.set_energy_price(&owner(), &principal(1), 4).unwrap();
    ledger.request_refund(&principal(2), &principal(1), 50).unwrap();

    let producer = ledger.producer(&principal(1)).unwrap();
    assert_eq!(producer.energy_available, 950);
    assert_eq!(producer.pending_revenue, 1000 - 200);
    assert_eq!(
        ledger.consumer_info(&principal(2)).unwrap(),
        ConsumerInfo {
            energy_consumed: 50,
            total_spent: 800
        }
    );
    assert_matches!(
        ledger.receipts().last().map(|receipt| &receipt.fact),
        Some(LedgerFact::RefundIssued {
            units: 50,
            refund_amount: 200,
            ..
        })
    );
}

#[test]
fn withdraw_returns_then_zeroes_revenue() {
    let mut ledger = MarketFixture::standard()
        .with_purchase(principal(2), principal(1), 30)
        .build();
    assert_eq!(ledger.withdraw_revenue(&principal(1)).unwrap(), 300);
    assert_eq!(ledger.pending_revenue(&principal(1)).unwrap(), 0);
    assert_eq!(ledger.withdraw_revenue(&principal(1)).unwrap(), 0);
}

#[test]
fn only_owner_sets_prices() {
    let mut ledger = MarketFixture::standard().build();
    for caller in [principal(1), principal(2), principal(7)] {
        let err = assert_state_unchanged!(ledger, {
            ledger.set_energy_price(&caller, &principal(1), 99).unwrap_err()
        });
        assert_matches!(err, LedgerError::NotOwner { .. });
        assert_eq!(err.render(), "(err u100)");
    }
    ledger.set_energy_price(&owner(), &principal(1), 99).unwrap();
    assert_eq!(ledger.producer_info(&principal(1)).unwrap().energy_price, 99);
}

#[test]
fn end_to_end_marketplace_withdraws_exactly_1000() {
    let mut ledger = empty_ledger();
    let producer = principal(1);
    let consumer = principal(2);

    let steps = [
        (producer.clone(), Operation::RegisterProducer { amount: 1000, price: 10 }),
        (consumer.clone(), Operation::RegisterConsumer),
        (
            consumer.clone(),
            Operation::BuyEnergy {
                producer: producer.clone(),
                units: 100,
            },
        ),
        (
            consumer.clone(),
            Operation::RateProducer {
                producer: producer.clone(),
                stars: 5,
            },
        ),
    ];
    for (caller, operation) in &steps {
        assert_eq!(ledger.apply(caller, operation).unwrap(), Outcome::Ack);
    }

    let info = ledger
        .apply(&producer, &Operation::GetProducerInfo { producer: producer.clone() })
        .unwrap();
    assert_eq!(info.to_string(), "(ok {energy-available: u900, energy-price: u10})");

    let withdrawn = ledger.apply(&producer, &Operation::WithdrawRevenue).unwrap();
    assert_eq!(withdrawn, Outcome::Amount(1000));
    assert_eq!(withdrawn.to_string(), "(ok u1000)");

    let rating = ledger.producer_rating(&producer).unwrap();
    assert_eq!((rating.rating_sum, rating.rating_count), (5, 1));
    assert_eq!(ledger.receipts().len(), 5);
}

#[test]
fn snapshot_survives_restore_and_keeps_numbering() {
    let ledger = MarketFixture::standard()
        .with_purchase(principal(2), principal(1), 100)
        .build();
    let json = ledger.snapshot().to_json_pretty().unwrap();

    let mut restored =
        Ledger::restore(owner_config(), LedgerSnapshot::from_json(&json).unwrap()).unwrap();
    assert_eq!(restored.state_digest().unwrap(), ledger.state_digest().unwrap());

    restored.withdraw_revenue(&principal(1)).unwrap();
    assert_eq!(restored.receipts()[0].sequence, ledger.sequence() + 1);
}

#[test]
fn zero_unit_refund_is_a_journaled_no_op() {
    let mut ledger = MarketFixture::standard().build();
    assert_rejected!(ledger.request_refund(&principal(2), &principal(1), 0), 108);

    ledger.buy_energy(&principal(2), &principal(1), 40).unwrap();
    let producer = *ledger.producer(&principal(1)).unwrap();
    let record = ledger.purchase_record(&principal(2), &principal(1)).unwrap();
    let sequence = ledger.sequence();

    ledger.request_refund(&principal(2), &principal(1), 0).unwrap();

    assert_eq!(*ledger.producer(&principal(1)).unwrap(), producer);
    assert_eq!(ledger.purchase_record(&principal(2), &principal(1)).unwrap(), record);
    assert_eq!(ledger.sequence(), sequence + 1);
    assert_matches!(
        ledger.receipts().last().map(|receipt| &receipt.fact),
        Some(LedgerFact::RefundIssued {
            units: 0,
            refund_amount: 0,
            ..
        })
    );

    ledger.request_refund(&principal(2), &principal(1), 40).unwrap();
    ledger.request_refund(&principal(2), &principal(1), 0).unwrap();
    assert_eq!(ledger.sequence(), sequence + 3);
}

/// Standard market with one purchase, restored after `edit` adjusts its rows.
fn restored_market(edit: impl FnOnce(&mut LedgerSnapshot)) -> Ledger {
    let mut snapshot = MarketFixture::standard()
        .with_purchase(principal(2), principal(1), 100)
        .build()
        .snapshot();
    edit(&mut snapshot);
    Ledger::restore(owner_config(), snapshot).unwrap()
}

#[test]
fn refund_overflow_is_rejected_without_mutation() {
    let mut ledger = MarketFixture::new()
        .with_producer(principal(1), 10, 1)
        .with_consumer(principal(2))
        .with_purchase(principal(2), principal(1), 2)
        .build();
    ledger.set_energy_price(&owner(), &principal(1), u64::MAX).unwrap();

    let err = assert_state_unchanged!(ledger, {
        ledger.request_refund(&principal(2), &principal(1), 2).unwrap_err()
    });
    assert_matches!(err, LedgerError::ArithmeticOverflow { context: "refund amount" });

    let mut ledger = restored_market(|snapshot| {
        snapshot.producers[0].producer.energy_available = u64::MAX;
    });
    let err = assert_state_unchanged!(ledger, {
        ledger.request_refund(&principal(2), &principal(1), 1).unwrap_err()
    });
    assert_matches!(err, LedgerError::ArithmeticOverflow { context: "energy available" });
}

#[test]
fn rating_overflow_is_rejected_without_mutation() {
    let mut ledger = restored_market(|snapshot| {
        snapshot.producers[0].producer.rating_sum = u64::MAX;
    });
    let err = assert_state_unchanged!(ledger, {
        ledger.rate_producer(&principal(2), &principal(1), 1).unwrap_err()
    });
    assert_matches!(err, LedgerError::ArithmeticOverflow { context: "rating sum" });

    let mut ledger = restored_market(|snapshot| {
        snapshot.producers[0].producer.rating_count = u64::MAX;
    });
    let err = assert_state_unchanged!(ledger, {
        ledger.rate_producer(&principal(2), &principal(1), 5).unwrap_err()
    });
    assert_eq!(err.render(), "(err u109)");
}
