//! Host-side error types for TxCompress.
//!
//! `HostError` covers failures of the world-state backend. The engine
//! surfaces them to callers as `BatchError::Host`, aborting the invocation.
//! `ConfigError` reports an `EngineConfig` the engine refuses to run with.

use txcompress_primitives::{Address, BatchError};
use txcompress_primitives::types::address_to_hex;

/// Failure reported by a `StateStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// A stored value could not be decoded.
    #[error("corrupt state for {}: {reason}", address_to_hex(.account))]
    CorruptState { account: Address, reason: String },

    /// The backend is unreachable or refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

}

impl From<HostError> for BatchError {
    fn from(err: HostError) -> Self {
        BatchError::Host(err.to_string())
    }
}

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_batch_size must be in 1..={max}, got {got}")]
    BatchSizeOutOfRange { got: usize, max: usize },

    #[error("gas_limit {limit} is below the per-invocation base cost {base}")]
    GasLimitTooLow { limit: u64, base: u64 },

    #[error("max_events {limit} leaves no room for {calls} call events plus the batch summary")]
    EventLimitTooLow { limit: u32, calls: usize },
}
