//! Sequential call dispatch for one invocation.
//!
//! The dispatcher owns the invocation's write buffer, event buffer and gas
//! meter. It runs in three steps:
//!
//! 1. `collect_payment` moves the attached payment from the invoker into
//!    the engine account.
//! 2. `dispatch_call` runs once per call, in batch order. It charges gas,
//!    moves `value` from the engine to the target, runs target logic for
//!    non-empty payloads and records a `call_executed` event.
//! 3. `refund` returns any excess payment; `close` records the
//!    `batch_executed` summary.
//!
//! Nothing here touches committed state. `finish` hands the buffered
//! writes and events back to the executor, which commits them only if the
//! ledger update also succeeds. Dropping a dispatcher discards everything.

use tracing::debug;
use txcompress_hostapi::{EngineConfig, StateStore};
use txcompress_primitives::gas::{call_cost, G_TX_BASE};
use txcompress_primitives::types::{address_to_hex, amount_to_le_bytes};
use txcompress_primitives::{
    Address, Amount, BatchError, BatchResult, Call, CallFailure, CallOutcome, Event,
    EventAttribute, GasMeter, Hash, InvalidBatchReason, StateChanges,
};

use crate::guard::EntryGuard;
use crate::host::{CallContext, CallTarget, EventBuffer, TargetRegistry, TransferError, World};

/// Event type recorded for every dispatched call.
pub const CALL_EXECUTED: &str = "call_executed";
/// Event type recorded once per committed batch.
pub const BATCH_EXECUTED: &str = "batch_executed";

/// Everything a finished dispatch produced.
pub(crate) struct Dispatched {
    pub(crate) changes: StateChanges,
    pub(crate) events: Vec<Event>,
    pub(crate) gas_used: u64,
}

pub(crate) struct Dispatcher<'s> {
    world: World<'s>,
    events: EventBuffer,
    meter: GasMeter,
    targets: &'s TargetRegistry,
    guard: &'s EntryGuard,
    max_return_len: usize,
    engine: Address,
    invoker: Address,
}

impl<'s> Dispatcher<'s> {
    pub(crate) fn new(
        store: &'s dyn StateStore,
        targets: &'s TargetRegistry,
        guard: &'s EntryGuard,
        config: &EngineConfig,
        engine: Address,
        invoker: Address,
    ) -> Self {
        Self {
            world: World::new(store),
            events: EventBuffer::new(config.max_events),
            meter: GasMeter::new(config.gas_limit),
            targets,
            guard,
            max_return_len: config.max_return_len,
            engine,
            invoker,
        }
    }

    /// Move the attached payment from the invoker to the engine account.
    pub(crate) fn collect_payment(&mut self, attached: Amount) -> BatchResult<()> {
        self.settle(self.invoker, self.engine, attached)
    }

    /// Return excess payment from the engine account to the invoker.
    pub(crate) fn refund(&mut self, amount: Amount) -> BatchResult<()> {
        self.settle(self.engine, self.invoker, amount)
    }

    /// Dispatch the call at `index`. Any failure aborts the batch.
    pub(crate) fn dispatch_call(&mut self, index: usize, call: &Call) -> BatchResult<CallOutcome> {
        let failed = |reason: CallFailure| BatchError::CallFailed {
            index,
            target: call.target,
            reason,
        };

        // The invocation base cost is charged with the first call.
        let mut cost = call_cost(call);
        if index == 0 {
            cost = cost.saturating_add(G_TX_BASE);
        }
        self.meter.consume(cost).map_err(failed)?;

        let targets = self.targets;
        let target = targets.get(&call.target);
        if call.value > 0 && target.is_some_and(|t| !t.accepts_value()) {
            return Err(failed(CallFailure::ValueRejected));
        }

        match self.world.transfer(self.engine, call.target, call.value) {
            Ok(()) => {}
            Err(TransferError::InsufficientBalance { .. }) => {
                return Err(failed(CallFailure::InsufficientBalance))
            }
            Err(TransferError::Overflow) => return Err(failed(CallFailure::BalanceOverflow)),
            Err(TransferError::Host(e)) => return Err(e.into()),
        }

        let return_data = match target {
            Some(logic) if !call.payload.is_empty() => self.invoke(index, call, logic)?,
            _ => Vec::new(),
        };
        if return_data.len() > self.max_return_len {
            return Err(failed(CallFailure::ReturnDataTooLarge {
                len: return_data.len(),
                max: self.max_return_len,
            }));
        }

        self.events
            .push(call_executed_event(index as u32, call))
            .map_err(failed)?;

        debug!(
            index,
            call_target = %address_to_hex(&call.target),
            value = %call.value,
            payload_len = call.payload.len(),
            gas_used = self.meter.consumed(),
            "call dispatched"
        );

        Ok(CallOutcome {
            index: index as u32,
            target: call.target,
            value: call.value,
            success: true,
            return_data,
        })
    }

    /// Record the batch summary event in the reserved slot.
    pub(crate) fn close(
        &mut self,
        batch_id: &Hash,
        call_count: usize,
        total_value: Amount,
        gas_saved: u64,
    ) {
        self.events.close(Event {
            call_index: None,
            event_type: BATCH_EXECUTED.into(),
            attributes: vec![
                EventAttribute::new("batch_id", batch_id.to_vec()),
                EventAttribute::new("invoker", self.invoker.to_vec()),
                EventAttribute::new("call_count", (call_count as u32).to_le_bytes().to_vec()),
                EventAttribute::new("total_value", amount_to_le_bytes(total_value).to_vec()),
                EventAttribute::new("gas_saved", gas_saved.to_le_bytes().to_vec()),
            ],
        });
    }

    pub(crate) fn gas_used(&self) -> u64 {
        self.meter.consumed()
    }

    pub(crate) fn finish(self) -> Dispatched {
        Dispatched {
            gas_used: self.meter.consumed(),
            changes: self.world.into_changes(),
            events: self.events.into_events(),
        }
    }

    fn invoke(
        &mut self,
        index: usize,
        call: &Call,
        logic: &dyn CallTarget,
    ) -> BatchResult<Vec<u8>> {
        let mut ctx = CallContext::new(
            &mut self.world,
            &mut self.events,
            self.guard,
            call.target,
            self.invoker,
            self.engine,
            call.value,
            index as u32,
        );
        let result = logic.on_call(&mut ctx, &call.payload);
        let report = ctx.finish();

        if let Some(err) = report.host_error {
            return Err(err.into());
        }
        match result {
            Ok(data) => Ok(data),
            Err(reason)
                if report.reentry_attempted
                    && reason == CallFailure::from(BatchError::Reentrancy) =>
            {
                Err(BatchError::Reentrancy)
            }
            Err(reason) => Err(BatchError::CallFailed {
                index,
                target: call.target,
                reason,
            }),
        }
    }

    fn settle(&mut self, from: Address, to: Address, amount: Amount) -> BatchResult<()> {
        match self.world.transfer(from, to, amount) {
            Ok(()) => Ok(()),
            Err(TransferError::InsufficientBalance {
                required,
                available,
            }) => Err(BatchError::InsufficientBalance {
                account: from,
                required,
                available,
            }),
            Err(TransferError::Overflow) => Err(InvalidBatchReason::ValueOverflow.into()),
            Err(TransferError::Host(e)) => Err(e.into()),
        }
    }
}

fn call_executed_event(index: u32, call: &Call) -> Event {
    Event {
        call_index: Some(index),
        event_type: CALL_EXECUTED.into(),
        attributes: vec![
            EventAttribute::new("index", index.to_le_bytes().to_vec()),
            EventAttribute::new("target", call.target.to_vec()),
            EventAttribute::new("value", amount_to_le_bytes(call.value).to_vec()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txcompress_hostapi::MemStore;
    use txcompress_primitives::types::ether;

    const INVOKER: Address = [0x11; 20];
    const ENGINE: Address = [0xEE; 20];
    const T1: Address = [0x01; 20];
    const T2: Address = [0x02; 20];

    struct Counter;

    impl CallTarget for Counter {
        fn on_call(
            &self,
            ctx: &mut CallContext<'_, '_>,
            payload: &[u8],
        ) -> Result<Vec<u8>, CallFailure> {
            let current = ctx.storage_get(b"count")?.map(|v| v[0]).unwrap_or(0);
            ctx.storage_set(b"count".to_vec(), vec![current + 1]);
            Ok(payload.to_vec())
        }
    }

    struct Refuses;

    impl CallTarget for Refuses {
        fn accepts_value(&self) -> bool {
            false
        }

        fn on_call(
            &self,
            _ctx: &mut CallContext<'_, '_>,
            _payload: &[u8],
        ) -> Result<Vec<u8>, CallFailure> {
            Ok(Vec::new())
        }
    }

    fn registry() -> TargetRegistry {
        let mut targets = TargetRegistry::new();
        targets.register(T1, Box::new(Counter));
        targets.register(T2, Box::new(Refuses));
        targets
    }

    #[test]
    fn test_payment_then_transfers() {
        let store = MemStore::with_balances([(INVOKER, ether(10))]);
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig::default();
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        d.collect_payment(ether(3)).unwrap();
        let call = Call::transfer([0x33; 20], ether(3));
        let outcome = d.dispatch_call(0, &call).unwrap();
        assert!(outcome.success);
        assert!(outcome.return_data.is_empty());
        assert_eq!(d.gas_used(), G_TX_BASE + call_cost(&call));

        let done = d.finish();
        assert_eq!(done.changes.balances.get(&INVOKER), Some(&ether(7)));
        assert_eq!(done.changes.balances.get(&ENGINE), Some(&0));
        assert_eq!(done.changes.balances.get(&[0x33; 20]), Some(&ether(3)));
        assert_eq!(done.events.len(), 1);
        assert_eq!(done.events[0].event_type, CALL_EXECUTED);
        // Committed state is untouched.
        assert_eq!(store.balance(&INVOKER).unwrap(), ether(10));
    }

    #[test]
    fn test_invoker_cannot_fund_payment() {
        let store = MemStore::with_balances([(INVOKER, ether(1))]);
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig::default();
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        let err = d.collect_payment(ether(2)).unwrap_err();
        assert_eq!(
            err,
            BatchError::InsufficientBalance {
                account: INVOKER,
                required: ether(2),
                available: ether(1),
            }
        );
    }

    #[test]
    fn test_target_logic_runs_only_with_payload() {
        let store = MemStore::new();
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig::default();
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        d.dispatch_call(0, &Call::transfer(T1, 0)).unwrap();
        let outcome = d.dispatch_call(1, &Call::new(T1, 0, b"hi".to_vec())).unwrap();
        assert_eq!(outcome.return_data, b"hi".to_vec());

        let done = d.finish();
        let slot = done.changes.storage.get(&(T1, b"count".to_vec()));
        assert_eq!(slot, Some(&Some(vec![1])));
    }

    #[test]
    fn test_value_rejected() {
        let store = MemStore::with_balances([(INVOKER, 5)]);
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig::default();
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        d.collect_payment(5).unwrap();
        let err = d.dispatch_call(0, &Call::transfer(T2, 5)).unwrap_err();
        assert_eq!(
            err,
            BatchError::CallFailed {
                index: 0,
                target: T2,
                reason: CallFailure::ValueRejected,
            }
        );
        // Zero-value calls are still accepted.
        assert!(d.dispatch_call(0, &Call::new(T2, 0, vec![1])).is_ok());
    }

    #[test]
    fn test_out_of_gas() {
        let store = MemStore::new();
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig {
            gas_limit: G_TX_BASE + 2_600,
            ..EngineConfig::default()
        };
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        d.dispatch_call(0, &Call::transfer([0x33; 20], 0)).unwrap();
        let err = d.dispatch_call(1, &Call::transfer([0x33; 20], 0)).unwrap_err();
        assert!(matches!(
            err,
            BatchError::CallFailed {
                index: 1,
                reason: CallFailure::OutOfGas { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_return_data_too_large() {
        let store = MemStore::new();
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig {
            max_return_len: 2,
            ..EngineConfig::default()
        };
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        let err = d.dispatch_call(0, &Call::new(T1, 0, b"abc".to_vec())).unwrap_err();
        assert!(matches!(
            err,
            BatchError::CallFailed {
                reason: CallFailure::ReturnDataTooLarge { len: 3, max: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_close_records_summary() {
        let store = MemStore::new();
        let targets = registry();
        let guard = EntryGuard::new();
        let config = EngineConfig::default();
        let mut d = Dispatcher::new(&store, &targets, &guard, &config, ENGINE, INVOKER);

        d.close(&[7u8; 32], 2, 10, 21_000);
        let events = d.finish().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, BATCH_EXECUTED);
        assert_eq!(events[0].call_index, None);
        assert_eq!(events[0].attribute("gas_saved"), Some(&21_000u64.to_le_bytes()[..]));
    }
}
