//! Reentrancy guard.
//!
//! The engine holds an [`EntryToken`] for the whole of an invocation.
//! While it is held, every further attempt to enter fails with
//! `BatchError::Reentrancy`. Dropping the token releases the guard, so it
//! is released on every exit path, including early returns through `?`.

use std::sync::atomic::{AtomicBool, Ordering};

use txcompress_primitives::{BatchError, BatchResult};

/// Single-entry lock for batch submission.
#[derive(Debug, Default)]
pub struct EntryGuard {
    entered: AtomicBool,
}

/// Proof of entry. Releases the guard on drop.
#[derive(Debug)]
pub struct EntryToken<'a> {
    guard: &'a EntryGuard,
}

impl EntryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the guarded section, or fail if an invocation is in flight.
    pub fn enter(&self) -> BatchResult<EntryToken<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| BatchError::Reentrancy)?;
        Ok(EntryToken { guard: self })
    }

    /// Returns true while an invocation holds the guard.
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for EntryToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
