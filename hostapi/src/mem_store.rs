//! In-memory state store.
//!
//! `MemStore` implements `StateStore` with `BTreeMap`s for deterministic
//! ordering. Used by tests and by hosts that keep state in memory.

use std::collections::BTreeMap;

use txcompress_primitives::{Address, Amount, StateChanges};

use crate::error::HostError;
use crate::state_store::StateStore;

/// In-memory state store backed by `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    balances: BTreeMap<Address, Amount>,
    storage: BTreeMap<(Address, Vec<u8>), Vec<u8>>,
}

impl MemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given accounts funded.
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, Amount)>) -> Self {
        Self {
            balances: balances.into_iter().collect(),
            storage: BTreeMap::new(),
        }
    }

    /// Set the committed balance of an account.
    pub fn set_balance(&mut self, addr: Address, amount: Amount) {
        self.balances.insert(addr, amount);
    }

    /// Sum of all committed balances.
    pub fn total_supply(&self) -> Amount {
        self.balances
            .values()
            .fold(0, |acc: Amount, b| acc.saturating_add(*b))
    }

    /// Number of accounts with a recorded balance.
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Number of occupied storage slots.
    pub fn slot_count(&self) -> usize {
        self.storage.len()
    }
}

impl StateStore for MemStore {
    fn balance(&self, addr: &Address) -> Result<Amount, HostError> {
        Ok(self.balances.get(addr).copied().unwrap_or(0))
    }

    fn storage_get(&self, owner: &Address, key: &[u8]) -> Result<Option<Vec<u8>>, HostError> {
        Ok(self.storage.get(&(*owner, key.to_vec())).cloned())
    }

    fn apply(&mut self, changes: StateChanges) -> Result<(), HostError> {
        for (addr, amount) in changes.balances {
            self.balances.insert(addr, amount);
        }
        for (slot, value) in changes.storage {
            match value {
                Some(v) => {
                    self.storage.insert(slot, v);
                }
                None => {
                    self.storage.remove(&slot);
                }
            }
        }
        Ok(())
    }
}
