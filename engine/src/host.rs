//! Call-target host interface.
//!
//! Target logic is plugged into the engine through the [`CallTarget`]
//! trait and registered per address in a [`TargetRegistry`]. When a call
//! with a non-empty payload reaches a registered target, the dispatcher
//! hands it a [`CallContext`]: the target's window onto the in-flight
//! invocation.
//!
//! Everything a target does through its context lands in the invocation's
//! `StateOverlay` and event buffer. If any later call fails, all of it is
//! discarded together with the rest of the batch.

use std::collections::BTreeMap;

use txcompress_hostapi::{HostError, StateStore};
use txcompress_primitives::{
    Address, Amount, BatchError, BatchOutcome, BatchResult, Call, CallFailure, Event,
    EventAttribute, OverlayResult, StateChanges, StateOverlay,
};

use crate::guard::EntryGuard;

/// Logic attached to a target address.
pub trait CallTarget: Send + Sync {
    /// Whether the target accepts calls that carry value.
    fn accepts_value(&self) -> bool {
        true
    }

    /// Handle a call with a non-empty payload.
    ///
    /// The forwarded value is already credited to the target when this
    /// runs. Returning `Err` aborts the whole batch.
    fn on_call(
        &self,
        ctx: &mut CallContext<'_, '_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure>;
}

// ── TargetRegistry ──

/// Registered target logic, keyed by address.
#[derive(Default)]
pub struct TargetRegistry {
    targets: BTreeMap<Address, Box<dyn CallTarget>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register logic for `address`, returning any logic it replaces.
    pub fn register(
        &mut self,
        address: Address,
        target: Box<dyn CallTarget>,
    ) -> Option<Box<dyn CallTarget>> {
        self.targets.insert(address, target)
    }

    pub fn get(&self, address: &Address) -> Option<&dyn CallTarget> {
        self.targets.get(address).map(|t| t.as_ref())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.targets.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.targets.keys().map(txcompress_primitives::types::address_to_hex))
            .finish()
    }
}

// ── World: committed state + invocation overlay ──

/// Why a balance move inside the overlay failed.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TransferError {
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("balance overflow")]
    Overflow,

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Read-through view of committed state with buffered writes on top.
pub(crate) struct World<'s> {
    store: &'s dyn StateStore,
    overlay: StateOverlay,
}

impl<'s> World<'s> {
    pub(crate) fn new(store: &'s dyn StateStore) -> Self {
        Self {
            store,
            overlay: StateOverlay::new(),
        }
    }

    pub(crate) fn balance(&self, addr: &Address) -> Result<Amount, HostError> {
        match self.overlay.balance(addr) {
            Some(balance) => Ok(balance),
            None => self.store.balance(addr),
        }
    }

    pub(crate) fn storage_get(
        &self,
        owner: &Address,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, HostError> {
        match self.overlay.storage_get(owner, key) {
            OverlayResult::Found(value) => Ok(Some(value)),
            OverlayResult::Deleted => Ok(None),
            OverlayResult::NotInOverlay => self.store.storage_get(owner, key),
        }
    }

    pub(crate) fn storage_set(&mut self, owner: Address, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.storage_set(owner, key, value);
    }

    pub(crate) fn storage_delete(&mut self, owner: Address, key: Vec<u8>) {
        self.overlay.storage_delete(owner, key);
    }

    /// Move `amount` from `from` to `to`. Leaves the overlay untouched on
    /// failure.
    pub(crate) fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let available = self.balance(&from)?;
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .balance(&to)?
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.overlay.set_balance(from, available - amount);
        self.overlay.set_balance(to, credited);
        Ok(())
    }

    /// Consume the view, returning its buffered writes.
    pub(crate) fn into_changes(self) -> StateChanges {
        self.overlay.drain()
    }
}

// ── EventBuffer ──

/// Events emitted by an in-flight invocation.
///
/// Calls may fill `limit - 1` slots; the last one is reserved for the
/// batch summary pushed with [`EventBuffer::close`].
#[derive(Debug)]
pub(crate) struct EventBuffer {
    events: Vec<Event>,
    limit: usize,
}

impl EventBuffer {
    pub(crate) fn new(limit: u32) -> Self {
        Self {
            events: Vec::new(),
            limit: limit as usize,
        }
    }

    pub(crate) fn push(&mut self, event: Event) -> Result<(), CallFailure> {
        if self.events.len() + 1 >= self.limit {
            return Err(CallFailure::Reverted(format!(
                "event limit of {} reached",
                self.limit
            )));
        }
        self.events.push(event);
        Ok(())
    }

    pub(crate) fn close(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn into_events(self) -> Vec<Event> {
        self.events
    }
}

// ── CallContext ──

/// What a target may do while handling a call.
///
/// Storage is scoped to the target's own address. Balance moves are only
/// possible out of the target's own balance.
pub struct CallContext<'a, 's> {
    world: &'a mut World<'s>,
    events: &'a mut EventBuffer,
    guard: &'a EntryGuard,
    address: Address,
    invoker: Address,
    engine: Address,
    value: Amount,
    index: u32,
    host_error: Option<HostError>,
    reentry_attempted: bool,
}

/// What the dispatcher needs to know after target logic returns.
pub(crate) struct ContextReport {
    pub(crate) host_error: Option<HostError>,
    pub(crate) reentry_attempted: bool,
}

impl<'a, 's> CallContext<'a, 's> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world: &'a mut World<'s>,
        events: &'a mut EventBuffer,
        guard: &'a EntryGuard,
        address: Address,
        invoker: Address,
        engine: Address,
        value: Amount,
        index: u32,
    ) -> Self {
        Self {
            world,
            events,
            guard,
            address,
            invoker,
            engine,
            value,
            index,
            host_error: None,
            reentry_attempted: false,
        }
    }

    /// Address of the target being called.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Account that submitted the batch.
    pub fn invoker(&self) -> Address {
        self.invoker
    }

    /// Address of the engine forwarding the call.
    pub fn engine(&self) -> Address {
        self.engine
    }

    /// Value forwarded with this call.
    pub fn value(&self) -> Amount {
        self.value
    }

    /// Position of this call in the batch.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn storage_get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, CallFailure> {
        let result = self.world.storage_get(&self.address, key);
        result.map_err(|e| self.host_failure(e))
    }

    pub fn storage_set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.world.storage_set(self.address, key.into(), value.into());
    }

    pub fn storage_remove(&mut self, key: impl Into<Vec<u8>>) {
        self.world.storage_delete(self.address, key.into());
    }

    /// Balance of any account as seen by this invocation.
    pub fn balance_of(&mut self, addr: &Address) -> Result<Amount, CallFailure> {
        let result = self.world.balance(addr);
        result.map_err(|e| self.host_failure(e))
    }

    /// Move `amount` out of the target's own balance.
    pub fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), CallFailure> {
        match self.world.transfer(self.address, to, amount) {
            Ok(()) => Ok(()),
            Err(TransferError::InsufficientBalance { .. }) => Err(CallFailure::InsufficientBalance),
            Err(TransferError::Overflow) => Err(CallFailure::BalanceOverflow),
            Err(TransferError::Host(e)) => Err(self.host_failure(e)),
        }
    }

    /// Emit an event attributed to this call.
    pub fn emit_event(
        &mut self,
        event_type: &str,
        attributes: Vec<EventAttribute>,
    ) -> Result<(), CallFailure> {
        self.events.push(Event {
            call_index: Some(self.index),
            event_type: event_type.into(),
            attributes,
        })
    }

    /// Re-entry handle.
    ///
    /// A batch is always in flight while target logic runs, so this fails
    /// with `BatchError::Reentrancy`. If the target propagates that
    /// rejection, the outer invocation aborts with `Reentrancy` as well.
    pub fn submit_batch(
        &mut self,
        calls: &[Call],
        attached_payment: Amount,
    ) -> BatchResult<BatchOutcome> {
        self.reentry_attempted = true;
        tracing::warn!(
            target_address = %txcompress_primitives::types::address_to_hex(&self.address),
            calls = calls.len(),
            attached_payment = %attached_payment,
            "nested batch submission rejected"
        );
        let _entry = self.guard.enter()?;
        // The dispatcher holds the guard for as long as a context exists.
        Err(BatchError::Reentrancy)
    }

    pub(crate) fn finish(self) -> ContextReport {
        ContextReport {
            host_error: self.host_error,
            reentry_attempted: self.reentry_attempted,
        }
    }

    fn host_failure(&mut self, err: HostError) -> CallFailure {
        let failure = CallFailure::Reverted(err.to_string());
        self.host_error.get_or_insert(err);
        failure
    }
}
