//! Backend world-state abstraction.
//!
//! `StateStore` holds committed state: account balances and the storage
//! slots target logic writes. The engine layers a `StateOverlay` over it
//! for each invocation: reads check the overlay first, then fall through
//! to the store. Only a committed invocation calls [`StateStore::apply`].
//!
//! Implementations:
//! - `MemStore` (this crate), backed by in-memory `BTreeMap`s

use txcompress_primitives::{Address, Amount, StateChanges};

use crate::error::HostError;

/// Committed world state.
pub trait StateStore: Send + Sync {
    /// Committed balance of `addr`. Unknown accounts hold zero.
    fn balance(&self, addr: &Address) -> Result<Amount, HostError>;

    /// Committed storage slot of target `owner`.
    ///
    /// Returns `Ok(None)` if the slot has never been written or was deleted.
    fn storage_get(&self, owner: &Address, key: &[u8]) -> Result<Option<Vec<u8>>, HostError>;

    /// Apply the writes of a committed invocation.
    ///
    /// Must be all-or-nothing: on `Err` the store is unchanged.
    fn apply(&mut self, changes: StateChanges) -> Result<(), HostError>;
}
