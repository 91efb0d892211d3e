//! Error types for TxCompress batch execution.
//!
//! Every way an invocation can abort is a [`BatchError`]. Aborts carry
//! zero net effect; the error is the only thing the caller gets back.

use crate::types::{address_to_hex, Address, Amount};

/// Stable numeric abort codes, suitable for receipts and logs.
///
/// The repr values are part of the external contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AbortCode {
    Ok = 0,
    InvalidBatch = 1,
    InsufficientPayment = 2,
    OverPayment = 3,
    CallFailed = 4,
    Reentrancy = 5,
    InsufficientBalance = 6,
    Host = 7,
}

impl AbortCode {
    /// Convert from a raw `u8` code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidBatch),
            2 => Some(Self::InsufficientPayment),
            3 => Some(Self::OverPayment),
            4 => Some(Self::CallFailed),
            5 => Some(Self::Reentrancy),
            6 => Some(Self::InsufficientBalance),
            7 => Some(Self::Host),
            _ => None,
        }
    }

    /// Return the `u8` representation of this code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true if this is the `Ok` variant.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl std::fmt::Display for AbortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::InvalidBatch => "ERR_INVALID_BATCH",
            Self::InsufficientPayment => "ERR_INSUFFICIENT_PAYMENT",
            Self::OverPayment => "ERR_OVER_PAYMENT",
            Self::CallFailed => "ERR_CALL_FAILED",
            Self::Reentrancy => "ERR_REENTRANCY",
            Self::InsufficientBalance => "ERR_INSUFFICIENT_BALANCE",
            Self::Host => "ERR_HOST",
        };
        f.write_str(name)
    }
}

/// Why a batch was rejected as structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBatchReason {
    #[error("batch is empty")]
    Empty,

    #[error("batch has {size} calls, maximum is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("sum of call values overflows")]
    ValueOverflow,

    #[error("usage statistics would overflow")]
    StatsOverflow,

    #[error("call {index} payload is {len} bytes, maximum is {max}")]
    PayloadTooLarge { index: usize, len: usize, max: usize },

    #[error("malformed submission: {0}")]
    Malformed(String),
}

/// Why a single call inside a batch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallFailure {
    /// Target logic rejected the call.
    #[error("reverted: {0}")]
    Reverted(String),

    /// Target does not accept value transfers.
    #[error("target rejects value")]
    ValueRejected,

    /// The invocation gas limit was reached while dispatching this call.
    #[error("out of gas: limit={limit}, used={used}")]
    OutOfGas { limit: u64, used: u64 },

    /// Crediting the target would overflow its balance.
    #[error("balance overflow")]
    BalanceOverflow,

    /// Target logic tried to move more value than it holds.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Target returned more data than the engine forwards.
    #[error("return data is {len} bytes, maximum is {max}")]
    ReturnDataTooLarge { len: usize, max: usize },
}

/// Reason an invocation aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("invalid batch: {0}")]
    InvalidBatch(InvalidBatchReason),

    #[error("insufficient payment: required {required}, attached {attached}")]
    InsufficientPayment { required: Amount, attached: Amount },

    #[error("overpayment: required {required}, attached {attached}")]
    OverPayment { required: Amount, attached: Amount },

    #[error("call {index} to {} failed: {reason}", address_to_hex(.target))]
    CallFailed {
        index: usize,
        target: Address,
        reason: CallFailure,
    },

    /// A batch was submitted while another one is still in flight.
    #[error("reentrant batch submission")]
    Reentrancy,

    /// The invoker cannot fund the attached payment.
    #[error(
        "insufficient balance in {}: required {required}, available {available}",
        address_to_hex(.account)
    )]
    InsufficientBalance {
        account: Address,
        required: Amount,
        available: Amount,
    },

    /// The world-state backend failed.
    #[error("host error: {0}")]
    Host(String),
}

impl BatchError {
    /// Numeric code for this error.
    pub fn code(&self) -> AbortCode {
        match self {
            Self::InvalidBatch(_) => AbortCode::InvalidBatch,
            Self::InsufficientPayment { .. } => AbortCode::InsufficientPayment,
            Self::OverPayment { .. } => AbortCode::OverPayment,
            Self::CallFailed { .. } => AbortCode::CallFailed,
            Self::Reentrancy => AbortCode::Reentrancy,
            Self::InsufficientBalance { .. } => AbortCode::InsufficientBalance,
            Self::Host(_) => AbortCode::Host,
        }
    }
}

impl From<InvalidBatchReason> for BatchError {
    fn from(reason: InvalidBatchReason) -> Self {
        Self::InvalidBatch(reason)
    }
}

/// A nested submission that aborts surfaces to target logic as a revert,
/// so targets can propagate it with `?`.
impl From<BatchError> for CallFailure {
    fn from(err: BatchError) -> Self {
        Self::Reverted(err.to_string())
    }
}

/// Convenience result type for batch execution.
pub type BatchResult<T> = Result<T, BatchError>;
