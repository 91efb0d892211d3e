//! `txcompress-engine`: atomic batch execution engine.
//!
//! An invoker hands the engine an ordered list of calls plus one payment.
//! The engine executes every call in order and either commits all of them
//! together with one usage-ledger update, or aborts with no effect at all.
//!
//! ## Architecture
//!
//! - [`validation`]: pre-dispatch checks (size, payload, payment)
//! - [`dispatcher`]: sequential call forwarding into a per-invocation overlay
//! - [`host::CallTarget`]: trait for logic attached to target addresses
//! - [`host::CallContext`]: what target logic may do while handling a call
//! - [`guard::EntryGuard`]: reentrancy guard held for a whole invocation
//! - [`ledger::Ledger`]: per-invoker and platform usage counters
//! - [`estimator`]: pure batched vs. individual gas comparison
//! - [`executor::BatchEngine`]: top-level entry point

pub mod guard;
pub mod host;
pub mod validation;
pub mod dispatcher;
pub mod ledger;
pub mod estimator;
pub mod executor;

// Re-export key types for convenience
pub use executor::BatchEngine;
pub use estimator::{estimate_batch_gas, GasEstimate};
pub use guard::EntryGuard;
pub use host::{CallContext, CallTarget, TargetRegistry};
pub use ledger::{Ledger, LedgerUpdate, PlatformStats, UserStats};
pub use validation::{validate_batch, PaymentPlan};
