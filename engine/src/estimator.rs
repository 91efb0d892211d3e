//! Gas-savings estimator.
//!
//! Compares sending each call as its own invocation with sending them all
//! as one batch. Each standalone invocation pays `G_TX_BASE`; the batch
//! pays it once. Marginal call costs are the same either way, so the
//! saving is `(N - 1) * G_TX_BASE`.
//!
//! The estimator is pure: it never validates, never touches state, and is
//! total over any input (arithmetic saturates).

use serde::{Deserialize, Serialize};
use txcompress_primitives::gas::{call_cost, G_TX_BASE};
use txcompress_primitives::Call;

/// Estimated cost of a batch against its unbatched equivalent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    /// Cost of sending every call as its own invocation.
    pub individual_cost: u64,
    /// Cost of sending the calls as one batch.
    pub batch_cost: u64,
    /// Saving as a whole percentage of `individual_cost`, rounded half-up.
    pub savings_percent: u8,
}

impl GasEstimate {
    /// Absolute gas saved by batching.
    pub fn gas_saved(&self) -> u64 {
        self.individual_cost.saturating_sub(self.batch_cost)
    }
}

/// Estimate the cost of `calls` batched versus sent one by one.
///
/// An empty batch estimates to all zeros.
pub fn estimate_batch_gas(calls: &[Call]) -> GasEstimate {
    if calls.is_empty() {
        return GasEstimate::default();
    }

    let (individual_cost, marginal) = calls.iter().fold((0u64, 0u64), |(ind, sum), call| {
        let cost = call_cost(call);
        (
            ind.saturating_add(G_TX_BASE.saturating_add(cost)),
            sum.saturating_add(cost),
        )
    });
    let batch_cost = G_TX_BASE.saturating_add(marginal);

    GasEstimate {
        individual_cost,
        batch_cost,
        savings_percent: savings_percent(individual_cost, batch_cost),
    }
}

fn savings_percent(individual: u64, batch: u64) -> u8 {
    if individual == 0 {
        return 0;
    }
    let saved = individual.saturating_sub(batch) as u128;
    let individual = individual as u128;
    let pct = (saved * 100 + individual / 2) / individual;
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use txcompress_primitives::gas::{G_CALL, G_CALL_VALUE};
    use txcompress_primitives::types::ether;

    #[test]
    fn test_three_transfers() {
        let calls = vec![
            Call::transfer([1u8; 20], ether(1)),
            Call::transfer([2u8; 20], ether(2)),
            Call::transfer([3u8; 20], ether(3)),
        ];
        let est = estimate_batch_gas(&calls);
        assert_eq!(est.individual_cost, 97_800);
        assert_eq!(est.batch_cost, 55_800);
        assert_eq!(est.gas_saved(), 42_000);
        assert_eq!(est.savings_percent, 43);
    }

    #[test]
    fn test_single_call_saves_nothing() {
        let est = estimate_batch_gas(&[Call::transfer([1u8; 20], 1)]);
        assert_eq!(est.individual_cost, est.batch_cost);
        assert_eq!(est.individual_cost, G_TX_BASE + G_CALL + G_CALL_VALUE);
        assert_eq!(est.gas_saved(), 0);
        assert_eq!(est.savings_percent, 0);
    }

    #[test]
    fn test_empty_batch_is_all_zeros() {
        assert_eq!(estimate_batch_gas(&[]), GasEstimate::default());
    }

    #[test]
    fn test_saved_is_base_times_n_minus_one() {
        for n in 1..=10usize {
            let calls: Vec<Call> = (0..n)
                .map(|i| Call::new([i as u8; 20], i as u128, vec![0, 1, 2]))
                .collect();
            let est = estimate_batch_gas(&calls);
            assert_eq!(est.gas_saved(), (n as u64 - 1) * G_TX_BASE);
        }
    }

    #[test]
    fn test_savings_percent_rounds_half_up() {
        assert_eq!(savings_percent(200, 199), 1); // 0.5% -> 1
        assert_eq!(savings_percent(1000, 996), 0); // 0.4% -> 0
        assert_eq!(savings_percent(100, 0), 100);
        assert_eq!(savings_percent(0, 0), 0);
    }

    #[test]
    fn test_savings_percent_at_u64_max() {
        assert_eq!(savings_percent(u64::MAX, u64::MAX), 0);
        assert_eq!(savings_percent(u64::MAX, 0), 100);
    }

    #[test]
    fn test_deterministic() {
        let calls = vec![Call::new([9u8; 20], 5, b"abc".to_vec())];
        assert_eq!(estimate_batch_gas(&calls), estimate_batch_gas(&calls));
    }
}
