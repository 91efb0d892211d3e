//! Gas accounting consistency tests.
//!
//! The estimator, the dispatcher's gas meter and the ledger share one cost
//! model, so for every committed batch:
//! - `gas_used` equals the estimator's batch cost
//! - `gas_saved` equals the estimator's saving
//! - the ledger records exactly that saving

mod common;

use txcompress_primitives::gas::{G_CALL, G_CALL_VALUE, G_PAYLOAD_NONZERO_BYTE, G_PAYLOAD_ZERO_BYTE, G_TX_BASE};
use txcompress_hostapi::EngineConfig;
use txcompress_primitives::types::ether;
use txcompress_primitives::{Call, MAX_BATCH_SIZE};

use common::*;

#[test]
fn test_three_transfer_estimate() {
    let engine = engine();
    let estimate = engine.estimate_batch_gas(&three_transfers());
    assert_eq!(estimate.individual_cost, 97_800);
    assert_eq!(estimate.batch_cost, 55_800);
    assert_eq!(estimate.savings_percent, 43);
}

#[test]
fn test_single_call_saves_nothing() {
    let engine = engine();
    let estimate = engine.estimate_batch_gas(&[Call::transfer(ALICE, 1)]);
    assert_eq!(estimate.savings_percent, 0);
    assert_eq!(estimate.gas_saved(), 0);
}

#[test]
fn test_estimate_does_not_touch_stats() {
    let engine = engine();
    let before = engine.read_platform_stats();
    for _ in 0..5 {
        engine.estimate_batch_gas(&three_transfers());
    }
    assert_eq!(engine.read_platform_stats(), before);
    assert_eq!(engine.read_user_stats(&INVOKER).batch_count, 0);
}

#[test]
fn test_estimate_of_invalid_batches() {
    let engine = engine();
    assert_eq!(engine.estimate_batch_gas(&[]).batch_cost, 0);
    let oversized = vec![Call::transfer(ALICE, 1); 150];
    assert_eq!(engine.estimate_batch_gas(&oversized).gas_saved(), 149 * G_TX_BASE);
}

#[test]
fn test_gas_used_matches_estimate() {
    let mut engine = engine();
    let calls = vec![
        Call::transfer(ALICE, ether(1)),
        Call::new(RECORDER, 0, vec![0, 0, 7, 9]),
        Call::new(ECHO, 0, Vec::new()),
    ];
    let estimate = engine.estimate_batch_gas(&calls);
    let outcome = engine.submit_batch(INVOKER, &calls, ether(1)).unwrap();

    let expected = G_TX_BASE
        + (G_CALL + G_CALL_VALUE)
        + (G_CALL + 2 * G_PAYLOAD_ZERO_BYTE + 2 * G_PAYLOAD_NONZERO_BYTE)
        + G_CALL;
    assert_eq!(outcome.gas_used, expected);
    assert_eq!(outcome.gas_used, estimate.batch_cost);
    assert_eq!(outcome.gas_saved, estimate.gas_saved());
    assert_eq!(
        engine.read_user_stats(&INVOKER).cumulative_gas_saved,
        estimate.gas_saved()
    );
}

#[test]
fn test_ledger_sums_savings_across_batches() {
    let mut engine = engine();
    let batches = [
        three_transfers(),
        vec![Call::transfer(ALICE, 1)],
        vec![Call::transfer(ALICE, 1), Call::transfer(BOB, 1)],
    ];
    let mut expected = 0;
    for calls in &batches {
        expected += engine.estimate_batch_gas(calls).gas_saved();
        engine.submit_batch(INVOKER, calls, total_value(calls)).unwrap();
    }
    assert_eq!(expected, 2 * G_TX_BASE + G_TX_BASE);
    assert_eq!(engine.read_platform_stats().total_gas_saved, expected);
    assert_eq!(engine.read_user_stats(&INVOKER).cumulative_gas_saved, expected);
}

#[test]
fn test_largest_valid_batch_fits_default_gas_limit() {
    let config = EngineConfig::default();
    let mut engine = engine();
    let calls: Vec<Call> = (0..MAX_BATCH_SIZE)
        .map(|_| Call::new(ALICE, 1, vec![0xAB; config.max_payload_len]))
        .collect();

    let outcome = engine
        .submit_batch(INVOKER, &calls, MAX_BATCH_SIZE as u128)
        .unwrap();
    assert_eq!(outcome.gas_used, config.worst_case_gas());
    assert!(outcome.gas_used <= config.gas_limit);
    assert_eq!(engine.balance_of(&ALICE).unwrap(), MAX_BATCH_SIZE as u128);
}
