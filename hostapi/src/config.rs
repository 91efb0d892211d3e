//! Engine configuration.
//!
//! `EngineConfig` bundles the resource limits and payment policy for every
//! invocation an engine instance runs. Hosts can load it from any serde
//! format; omitted fields take their defaults.

use serde::{Deserialize, Serialize};
use txcompress_primitives::gas::{G_CALL, G_CALL_VALUE, G_PAYLOAD_NONZERO_BYTE, G_TX_BASE};
use txcompress_primitives::MAX_BATCH_SIZE;

use crate::error::ConfigError;

/// How the attached payment must relate to the sum of call values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPolicy {
    /// Payment must equal the sum exactly; overpayment is rejected.
    #[default]
    Exact,
    /// Overpayment is accepted and the excess returned to the invoker in
    /// the same invocation. Underpayment is still rejected.
    RefundExcess,
}

/// Limits and policy applied to each invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gas available to one invocation. A limit below
    /// [`EngineConfig::worst_case_gas`] lets a batch that passes validation
    /// still run out of gas.
    pub gas_limit: u64,
    /// Maximum calls per batch. Never above `MAX_BATCH_SIZE`.
    pub max_batch_size: usize,
    /// Maximum payload length of a single call, in bytes.
    pub max_payload_len: usize,
    /// Maximum return data forwarded from a single call, in bytes.
    pub max_return_len: usize,
    /// Maximum events a single invocation may emit, engine events included.
    /// Must exceed `max_batch_size` so every call's `call_executed` event and
    /// the batch summary fit.
    pub max_events: u32,
    pub payment_policy: PaymentPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_limit: 30_000_000,
            max_batch_size: MAX_BATCH_SIZE,
            max_payload_len: 16 * 1024,  // 16 KiB
            max_return_len: 64 * 1024,   // 64 KiB
            max_events: 1024,
            payment_policy: PaymentPolicy::Exact,
        }
    }
}

impl EngineConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSizeOutOfRange {
                got: self.max_batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        if self.gas_limit < G_TX_BASE {
            return Err(ConfigError::GasLimitTooLow {
                limit: self.gas_limit,
                base: G_TX_BASE,
            });
        }
        if (self.max_events as usize) <= self.max_batch_size {
            return Err(ConfigError::EventLimitTooLow {
                limit: self.max_events,
                calls: self.max_batch_size,
            });
        }
        Ok(())
    }

    /// Gas used by the most expensive batch validation accepts: every call
    /// moves value and carries a full payload of non-zero bytes.
    pub fn worst_case_gas(&self) -> u64 {
        let payload = (self.max_payload_len as u64).saturating_mul(G_PAYLOAD_NONZERO_BYTE);
        let per_call = (G_CALL + G_CALL_VALUE).saturating_add(payload);
        (self.max_batch_size as u64)
            .saturating_mul(per_call)
            .saturating_add(G_TX_BASE)
    }
}
