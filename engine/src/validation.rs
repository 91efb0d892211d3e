//! Batch validation.
//!
//! These checks run before anything else in an invocation and have no
//! side effects. A batch is accepted only if it is non-empty, within the
//! size limit, every payload is within the payload limit, the call values
//! sum without overflow, and the attached payment matches that sum under
//! the configured payment policy.
//!
//! Checks run in that order, so an empty or oversized batch is rejected
//! as `InvalidBatch` whatever payment is attached.

use txcompress_hostapi::{EngineConfig, PaymentPolicy};
use txcompress_primitives::{
    Amount, BatchError, BatchResult, Call, InvalidBatchReason, MAX_BATCH_SIZE,
};

/// How the attached payment will be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    /// Sum of all call values.
    pub required: Amount,
    /// Excess returned to the invoker. Always zero under `Exact`.
    pub refund: Amount,
}

/// Effective batch size limit: the configured limit, capped at
/// `MAX_BATCH_SIZE`.
pub fn batch_size_limit(config: &EngineConfig) -> usize {
    config.max_batch_size.min(MAX_BATCH_SIZE)
}

/// Check batch structure: non-empty, within size, payloads within limit.
pub fn validate_shape(calls: &[Call], config: &EngineConfig) -> BatchResult<()> {
    if calls.is_empty() {
        return Err(InvalidBatchReason::Empty.into());
    }

    let max = batch_size_limit(config);
    if calls.len() > max {
        return Err(InvalidBatchReason::TooLarge {
            size: calls.len(),
            max,
        }
        .into());
    }

    if let Some((index, call)) = calls
        .iter()
        .enumerate()
        .find(|(_, c)| c.payload.len() > config.max_payload_len)
    {
        return Err(InvalidBatchReason::PayloadTooLarge {
            index,
            len: call.payload.len(),
            max: config.max_payload_len,
        }
        .into());
    }

    Ok(())
}

/// Sum of all call values, with overflow checking.
pub fn required_payment(calls: &[Call]) -> BatchResult<Amount> {
    calls
        .iter()
        .try_fold(0 as Amount, |acc, c| acc.checked_add(c.value))
        .ok_or_else(|| InvalidBatchReason::ValueOverflow.into())
}

/// Match the attached payment against the required amount.
///
/// Returns the excess to refund.
pub fn validate_payment(
    required: Amount,
    attached: Amount,
    policy: PaymentPolicy,
) -> BatchResult<Amount> {
    if attached < required {
        return Err(BatchError::InsufficientPayment { required, attached });
    }
    let excess = attached - required;
    match policy {
        PaymentPolicy::Exact if excess > 0 => {
            Err(BatchError::OverPayment { required, attached })
        }
        PaymentPolicy::Exact => Ok(0),
        PaymentPolicy::RefundExcess => Ok(excess),
    }
}

/// Run every pre-dispatch check on a candidate batch.
pub fn validate_batch(
    calls: &[Call],
    attached: Amount,
    config: &EngineConfig,
) -> BatchResult<PaymentPlan> {
    validate_shape(calls, config)?;
    let required = required_payment(calls)?;
    let refund = validate_payment(required, attached, config.payment_policy)?;
    Ok(PaymentPlan { required, refund })
}
