//! Transactional state overlay for one batch invocation.
//!
//! Every effect of a batch (the attached payment, value moved to each
//! target, storage written by target logic) lands in a `StateOverlay`
//! layered over committed state. Reads see committed state plus the
//! buffered writes. On commit the overlay is drained into a
//! [`StateChanges`] set and applied to the store in one step; on abort it
//! is dropped and nothing reaches committed state.

use std::collections::BTreeMap;

use crate::types::{Address, Amount};

/// Storage slot key: owning target plus the target-chosen key.
pub type StorageKey = (Address, Vec<u8>);

/// Write buffer overlaying committed state.
///
/// `BTreeMap` keeps drain order deterministic.
#[derive(Debug, Clone, Default)]
pub struct StateOverlay {
    /// Buffered balances, stored as absolute post-write values.
    balances: BTreeMap<Address, Amount>,
    /// Buffered storage: `Some(value)` for sets, `None` for deletions.
    storage: BTreeMap<StorageKey, Option<Vec<u8>>>,
}

/// Result of looking up a storage slot in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayResult {
    /// Slot was written in this overlay with this value.
    Found(Vec<u8>),
    /// Slot was explicitly deleted in this overlay.
    Deleted,
    /// Slot is untouched; the caller must check committed state.
    NotInOverlay,
}

/// The complete, ordered set of writes produced by a committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChanges {
    pub balances: BTreeMap<Address, Amount>,
    pub storage: BTreeMap<StorageKey, Option<Vec<u8>>>,
}

impl StateChanges {
    /// Returns true if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty() && self.storage.is_empty()
    }
}

impl StateOverlay {
    /// Create a new empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered balance for `addr`, or `None` if untouched in this overlay.
    pub fn balance(&self, addr: &Address) -> Option<Amount> {
        self.balances.get(addr).copied()
    }

    /// Buffer an absolute balance for `addr`.
    pub fn set_balance(&mut self, addr: Address, amount: Amount) {
        self.balances.insert(addr, amount);
    }

    /// Look up a storage slot in the overlay.
    pub fn storage_get(&self, owner: &Address, key: &[u8]) -> OverlayResult {
        // BTreeMap<(Address, Vec<u8>), _> needs an owned key to look up.
        match self.storage.get(&(*owner, key.to_vec())) {
            Some(Some(value)) => OverlayResult::Found(value.clone()),
            Some(None) => OverlayResult::Deleted,
            None => OverlayResult::NotInOverlay,
        }
    }

    /// Buffer a storage write, replacing any earlier write to the slot.
    pub fn storage_set(&mut self, owner: Address, key: Vec<u8>, value: Vec<u8>) {
        self.storage.insert((owner, key), Some(value));
    }

    /// Buffer a storage deletion. Later reads return `Deleted` rather than
    /// falling through to committed state.
    pub fn storage_delete(&mut self, owner: Address, key: Vec<u8>) {
        self.storage.insert((owner, key), None);
    }

    /// Consume the overlay and return its writes for commit.
    pub fn drain(self) -> StateChanges {
        StateChanges {
            balances: self.balances,
            storage: self.storage,
        }
    }
}
