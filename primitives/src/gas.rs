//! Gas cost model for TxCompress.
//!
//! One model serves three consumers: the estimator's "individual vs.
//! batched" comparison, the dispatcher's gas meter, and the gas-saved
//! figure the ledger records. Keeping them on the same functions keeps
//! the three numbers consistent.
//!
//! An invocation pays [`G_TX_BASE`] once, then each call pays
//! [`call_cost`]: a dispatch cost, a value surcharge when value moves,
//! and a per-byte payload charge.

use crate::call::Call;
use crate::error::CallFailure;

// ── Gas cost constants ──

/// Fixed overhead of one invocation, paid once per batch.
pub const G_TX_BASE: u64 = 21_000;

/// Dispatch cost of one call.
pub const G_CALL: u64 = 2_600;

/// Surcharge for a call that moves non-zero value.
pub const G_CALL_VALUE: u64 = 9_000;

/// Cost per zero payload byte.
pub const G_PAYLOAD_ZERO_BYTE: u64 = 4;

/// Cost per non-zero payload byte.
pub const G_PAYLOAD_NONZERO_BYTE: u64 = 16;

/// Gas charged for carrying `payload` to its target.
pub fn payload_cost(payload: &[u8]) -> u64 {
    let zeros = payload.iter().filter(|b| **b == 0).count() as u64;
    let nonzeros = payload.len() as u64 - zeros;
    zeros
        .saturating_mul(G_PAYLOAD_ZERO_BYTE)
        .saturating_add(nonzeros.saturating_mul(G_PAYLOAD_NONZERO_BYTE))
}

/// Marginal gas of one call, identical whether sent alone or in a batch.
pub fn call_cost(call: &Call) -> u64 {
    let value_cost = if call.value > 0 { G_CALL_VALUE } else { 0 };
    G_CALL
        .saturating_add(value_cost)
        .saturating_add(payload_cost(&call.payload))
}

/// Tracks gas consumption for one invocation.
///
/// Consumption is checked before it is applied, so a failed charge
/// leaves the meter untouched.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Create a new gas meter with the given limit.
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Consume gas. Fails with `OutOfGas` if the limit would be exceeded.
    pub fn consume(&mut self, amount: u64) -> Result<(), CallFailure> {
        match self.consumed.checked_add(amount) {
            Some(v) if v <= self.limit => {
                self.consumed = v;
                Ok(())
            }
            _ => Err(CallFailure::OutOfGas {
                limit: self.limit,
                used: self.consumed.saturating_add(amount),
            }),
        }
    }

    /// Returns the total gas consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}
