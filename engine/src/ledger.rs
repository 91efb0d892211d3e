//! Usage ledger.
//!
//! Records, per invoker and for the platform as a whole, how many batches
//! have committed and how much gas batching saved. The ledger is touched
//! once per committed invocation, after every call has returned.
//!
//! Updates are two-phase. [`Ledger::prepare`] computes the new counters
//! with checked arithmetic and can fail; [`Ledger::apply`] installs a
//! prepared update and cannot. The engine prepares before committing any
//! state, so a counter overflow aborts the whole invocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use txcompress_primitives::{Address, BatchResult, InvalidBatchReason};

/// Per-invoker usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub batch_count: u64,
    pub cumulative_gas_saved: u64,
}

/// Platform-wide usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_batches_executed: u64,
    pub total_gas_saved: u64,
}

/// Counters after one committed batch, ready to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a prepared update has no effect until applied"]
pub struct LedgerUpdate {
    invoker: Address,
    user: UserStats,
    platform: PlatformStats,
}

impl LedgerUpdate {
    /// The invoker's counters once this update is applied.
    pub fn user(&self) -> UserStats {
        self.user
    }
}

/// Keyed usage store owned by one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    users: BTreeMap<Address, UserStats>,
    platform: PlatformStats,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted counters.
    pub fn from_parts(
        users: impl IntoIterator<Item = (Address, UserStats)>,
        platform: PlatformStats,
    ) -> Self {
        Self {
            users: users.into_iter().collect(),
            platform,
        }
    }

    /// Stats for `invoker`. Invokers without a committed batch read as zero.
    pub fn user_stats(&self, invoker: &Address) -> UserStats {
        self.users.get(invoker).copied().unwrap_or_default()
    }

    pub fn platform_stats(&self) -> PlatformStats {
        self.platform
    }

    /// Invokers with at least one committed batch, in address order.
    pub fn users(&self) -> impl Iterator<Item = (&Address, &UserStats)> {
        self.users.iter()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Compute the counters after one more batch by `invoker` that saved
    /// `gas_saved`. Fails with `StatsOverflow` if any counter would wrap.
    pub fn prepare(&self, invoker: &Address, gas_saved: u64) -> BatchResult<LedgerUpdate> {
        let user = self.user_stats(invoker);
        let overflow = || InvalidBatchReason::StatsOverflow;

        let user = UserStats {
            batch_count: user.batch_count.checked_add(1).ok_or_else(overflow)?,
            cumulative_gas_saved: user
                .cumulative_gas_saved
                .checked_add(gas_saved)
                .ok_or_else(overflow)?,
        };
        let platform = PlatformStats {
            total_batches_executed: self
                .platform
                .total_batches_executed
                .checked_add(1)
                .ok_or_else(overflow)?,
            total_gas_saved: self
                .platform
                .total_gas_saved
                .checked_add(gas_saved)
                .ok_or_else(overflow)?,
        };

        Ok(LedgerUpdate {
            invoker: *invoker,
            user,
            platform,
        })
    }

    /// Install a prepared update.
    pub fn apply(&mut self, update: LedgerUpdate) {
        self.users.insert(update.invoker, update.user);
        self.platform = update.platform;
    }
}
