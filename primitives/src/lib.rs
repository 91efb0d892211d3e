//! `txcompress-primitives`: foundational types for TxCompress batch execution.
//!
//! This crate provides the call and outcome types, the abort taxonomy, the
//! gas cost model, the per-invocation state overlay, and the deterministic
//! codec shared by the engine and the host backend.

pub mod types;
pub mod error;
pub mod gas;
pub mod call;
pub mod state;
pub mod codec;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, Amount, Hash, MAX_BATCH_SIZE, WEI_PER_ETHER};
pub use error::{AbortCode, BatchError, BatchResult, CallFailure, InvalidBatchReason};
pub use gas::GasMeter;
pub use call::{
    Batch, BatchOutcome, Call, CallOutcome, Event, EventAttribute, InvocationPhase,
    SubmitRequest,
};
pub use state::{OverlayResult, StateChanges, StateOverlay};
