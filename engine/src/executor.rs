//! Batch engine: the atomic entry point.
//!
//! `BatchEngine::submit_batch` runs one invocation through its lifecycle:
//!
//! 1. **Validating**: shape, value sum and payment checks. No effects.
//! 2. **Executing**: payment collection, then each call in order, all
//!    into a per-invocation overlay.
//! 3. **Settling**: refund of any excess, ledger update prepared with
//!    checked arithmetic, batch summary event recorded.
//! 4. **Committed**: overlay applied to the store, ledger update
//!    installed, events published.
//!
//! **Atomicity:** a failure at any point before commit drops the overlay,
//! the buffered events and the prepared ledger update. The caller gets the
//! `BatchError` and nothing else changes.
//!
//! **Reentrancy:** the engine's entry guard is held for the whole
//! invocation. Target logic that tries to submit a nested batch is
//! rejected, and the ledger is only touched after every call returned.

use tracing::{debug, info, instrument, warn};
use txcompress_hostapi::{ConfigError, EngineConfig, HostError, StateStore};
use txcompress_primitives::codec::{batch_id, decode_submit_request};
use txcompress_primitives::types::address_to_hex;
use txcompress_primitives::{
    Address, Amount, BatchOutcome, BatchResult, Call, Event, InvocationPhase,
};

use crate::dispatcher::Dispatcher;
use crate::estimator::{estimate_batch_gas, GasEstimate};
use crate::guard::EntryGuard;
use crate::host::{CallTarget, TargetRegistry};
use crate::ledger::{Ledger, PlatformStats, UserStats};
use crate::validation::validate_batch;

/// Tracks the lifecycle of one invocation.
#[derive(Debug)]
struct PhaseTracker {
    phase: InvocationPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: InvocationPhase::Validating,
        }
    }

    fn advance(&mut self, next: InvocationPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase transition {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }

    fn current(&self) -> InvocationPhase {
        self.phase
    }
}

/// Engine state borrowed by a running invocation.
///
/// Kept apart from the entry guard so an invocation can hold the guard
/// while mutating everything else.
struct EngineCore<S> {
    address: Address,
    store: S,
    config: EngineConfig,
    targets: TargetRegistry,
    ledger: Ledger,
}

impl<S: StateStore> EngineCore<S> {
    fn execute(
        &mut self,
        guard: &EntryGuard,
        phase: &mut PhaseTracker,
        invoker: Address,
        calls: &[Call],
        attached_payment: Amount,
    ) -> BatchResult<BatchOutcome> {
        let plan = validate_batch(calls, attached_payment, &self.config)?;

        phase.advance(InvocationPhase::Executing);
        let sequence = self.ledger.user_stats(&invoker).batch_count;
        let batch_id = batch_id(&invoker, sequence, calls)?;

        let mut dispatcher = Dispatcher::new(
            &self.store,
            &self.targets,
            guard,
            &self.config,
            self.address,
            invoker,
        );
        dispatcher.collect_payment(attached_payment)?;
        let mut outcomes = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            outcomes.push(dispatcher.dispatch_call(index, call)?);
        }

        phase.advance(InvocationPhase::Settling);
        if plan.refund > 0 {
            dispatcher.refund(plan.refund)?;
        }
        let gas_saved = estimate_batch_gas(calls).gas_saved();
        let update = self.ledger.prepare(&invoker, gas_saved)?;
        debug!(batch_count = update.user().batch_count, "ledger update prepared");
        dispatcher.close(&batch_id, calls.len(), plan.required, gas_saved);
        debug!(gas_used = dispatcher.gas_used(), gas_saved, "dispatch complete");

        let dispatched = dispatcher.finish();
        self.store.apply(dispatched.changes)?;
        self.ledger.apply(update);

        Ok(BatchOutcome {
            batch_id,
            invoker,
            calls: outcomes,
            total_value: plan.required,
            refunded: plan.refund,
            gas_used: dispatched.gas_used,
            gas_saved,
            events: dispatched.events,
        })
    }
}

/// Atomic batch execution engine.
///
/// Owns the committed state store, the registered call targets, the usage
/// ledger and the committed event log. `submit_batch` takes `&mut self`,
/// so invocations are never interleaved.
pub struct BatchEngine<S: StateStore> {
    core: EngineCore<S>,
    guard: EntryGuard,
    events: Vec<Event>,
}

impl<S: StateStore> BatchEngine<S> {
    /// Create an engine at `address` over `store`.
    pub fn new(address: Address, store: S, config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_ledger(address, store, config, Ledger::new())
    }

    /// Create an engine with previously persisted usage counters.
    pub fn with_ledger(
        address: Address,
        store: S,
        config: EngineConfig,
        ledger: Ledger,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.gas_limit < config.worst_case_gas() {
            warn!(
                gas_limit = config.gas_limit,
                worst_case = config.worst_case_gas(),
                "gas limit below largest valid batch"
            );
        }
        Ok(Self {
            core: EngineCore {
                address,
                store,
                config,
                targets: TargetRegistry::new(),
                ledger,
            },
            guard: EntryGuard::new(),
            events: Vec::new(),
        })
    }

    /// Attach logic to `address`. Replaces any logic already there.
    pub fn register_target(&mut self, address: Address, target: impl CallTarget + 'static) {
        if self.core.targets.register(address, Box::new(target)).is_some() {
            debug!(address = %address_to_hex(&address), "call target replaced");
        }
    }

    /// Execute `calls` atomically on behalf of `invoker`.
    ///
    /// `attached_payment` must equal the sum of call values (or exceed it
    /// under `PaymentPolicy::RefundExcess`). Either every call takes effect
    /// and the ledger records the batch, or nothing changes.
    #[instrument(
        skip(self, calls, invoker, attached_payment),
        fields(
            invoker = %address_to_hex(&invoker),
            calls = calls.len(),
            attached_payment = %attached_payment
        )
    )]
    pub fn submit_batch(
        &mut self,
        invoker: Address,
        calls: &[Call],
        attached_payment: Amount,
    ) -> BatchResult<BatchOutcome> {
        let _entry = self.guard.enter()?;
        let mut phase = PhaseTracker::new();

        match self
            .core
            .execute(&self.guard, &mut phase, invoker, calls, attached_payment)
        {
            Ok(outcome) => {
                phase.advance(InvocationPhase::Committed);
                self.events.extend(outcome.events.iter().cloned());
                info!(
                    batch_id = %txcompress_primitives::types::to_hex(&outcome.batch_id),
                    total_value = %outcome.total_value,
                    refunded = %outcome.refunded,
                    gas_used = outcome.gas_used,
                    gas_saved = outcome.gas_saved,
                    "batch committed"
                );
                Ok(outcome)
            }
            Err(err) => {
                let failed_in = phase.current();
                phase.advance(InvocationPhase::Aborted);
                warn!(
                    phase = %failed_in,
                    code = %err.code(),
                    error = %err,
                    "batch aborted"
                );
                Err(err)
            }
        }
    }

    /// Decode a packaged submission and execute it.
    pub fn submit_encoded(&mut self, bytes: &[u8]) -> BatchResult<BatchOutcome> {
        let request = decode_submit_request(bytes).inspect_err(|err| {
            warn!(error = %err, len = bytes.len(), "rejected malformed submission");
        })?;
        self.submit_batch(request.invoker, &request.calls, request.attached_payment)
    }

    /// Estimate what batching `calls` saves. Never mutates.
    pub fn estimate_batch_gas(&self, calls: &[Call]) -> GasEstimate {
        estimate_batch_gas(calls)
    }

    pub fn read_platform_stats(&self) -> PlatformStats {
        self.core.ledger.platform_stats()
    }

    pub fn read_user_stats(&self, invoker: &Address) -> UserStats {
        self.core.ledger.user_stats(invoker)
    }

    /// Committed balance of `addr`.
    pub fn balance_of(&self, addr: &Address) -> Result<Amount, HostError> {
        self.core.store.balance(addr)
    }

    /// Committed storage slot `key` of `target`.
    pub fn storage_of(&self, target: &Address, key: &[u8]) -> Result<Option<Vec<u8>>, HostError> {
        self.core.store.storage_get(target, key)
    }

    /// Events published by committed batches, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn address(&self) -> Address {
        self.core.address
    }

    pub fn store(&self) -> &S {
        &self.core.store
    }

    /// Consume the engine, returning its store and ledger for persistence.
    pub fn into_parts(self) -> (S, Ledger) {
        (self.core.store, self.core.ledger)
    }
}
