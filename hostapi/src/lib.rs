//! `txcompress-hostapi`: host-side world state and configuration for the
//! TxCompress batch engine.
//!
//! This crate defines what the engine needs from the environment it runs in:
//!
//! - `StateStore`: trait for committed balances and target storage
//! - `MemStore`: in-memory `StateStore`
//! - `EngineConfig`: per-invocation limits and payment policy
//! - `HostError` / `ConfigError`: host-side error types

pub mod error;
pub mod config;
pub mod state_store;
pub mod mem_store;

// Re-export commonly used types at the crate root.
pub use error::{ConfigError, HostError};
pub use config::{EngineConfig, PaymentPolicy};
pub use state_store::StateStore;
pub use mem_store::MemStore;
