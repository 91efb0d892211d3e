//! Shared test helpers for integration tests.
//!
//! Provides named accounts, funded stores, engine factories and a set of
//! sample call targets used across all integration test files.

#![allow(dead_code)]

use txcompress_engine::{BatchEngine, CallContext, CallTarget};
use txcompress_hostapi::{EngineConfig, MemStore};
use txcompress_primitives::types::ether;
use txcompress_primitives::{Address, Amount, Call, CallFailure, EventAttribute};

// ── Named Accounts ──

pub const ENGINE: Address = [0xEE; 20];
pub const INVOKER: Address = [0x99; 20];
pub const ALICE: Address = [0xA1; 20];
pub const BOB: Address = [0xB0; 20];
pub const CHARLIE: Address = [0xC4; 20];

/// Target addresses for the sample call targets below.
pub const RECORDER: Address = [0x10; 20];
pub const REVERTER: Address = [0x11; 20];
pub const REENTRANT: Address = [0x12; 20];
pub const SWALLOWING_REENTRANT: Address = [0x13; 20];
pub const ECHO: Address = [0x14; 20];
pub const VAULT: Address = [0x15; 20];
pub const FORWARDER: Address = [0x16; 20];

/// Starting balance of `INVOKER` in engines built by [`engine`].
pub const INVOKER_FUNDS: u64 = 1_000;

// ── Logging ──

/// Install a tracing subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Engine Builders ──

/// A store with `INVOKER` funded with `INVOKER_FUNDS` ether.
pub fn funded_store() -> MemStore {
    MemStore::with_balances([(INVOKER, ether(INVOKER_FUNDS))])
}

/// An engine with default config and every sample target registered.
pub fn engine() -> BatchEngine<MemStore> {
    engine_with_config(EngineConfig::default())
}

/// An engine with a custom config and every sample target registered.
pub fn engine_with_config(config: EngineConfig) -> BatchEngine<MemStore> {
    init_tracing();
    let mut engine = BatchEngine::new(ENGINE, funded_store(), config).unwrap();
    engine.register_target(RECORDER, Recorder);
    engine.register_target(REVERTER, Reverter);
    engine.register_target(REENTRANT, Reentrant { swallow: false });
    engine.register_target(SWALLOWING_REENTRANT, Reentrant { swallow: true });
    engine.register_target(ECHO, Echo);
    engine.register_target(VAULT, Vault);
    engine.register_target(FORWARDER, Forwarder);
    engine
}

/// Sum of call values: the exact payment a batch needs.
pub fn total_value(calls: &[Call]) -> Amount {
    calls.iter().map(|c| c.value).sum()
}

/// `[{alice, 1 ETH}, {bob, 2 ETH}, {charlie, 3 ETH}]`
pub fn three_transfers() -> Vec<Call> {
    vec![
        Call::transfer(ALICE, ether(1)),
        Call::transfer(BOB, ether(2)),
        Call::transfer(CHARLIE, ether(3)),
    ]
}

// ── Sample Call Targets ──

/// Appends each payload to a log in its storage and counts calls.
pub struct Recorder;

impl CallTarget for Recorder {
    fn on_call(
        &self,
        ctx: &mut CallContext<'_, '_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        let mut log = ctx.storage_get(b"log")?.unwrap_or_default();
        log.extend_from_slice(payload);
        ctx.storage_set(b"log".to_vec(), log);

        let count = ctx
            .storage_get(b"count")?
            .map(|v| u32::from_le_bytes([v[0], v[1], v[2], v[3]]))
            .unwrap_or(0)
            + 1;
        ctx.storage_set(b"count".to_vec(), count.to_le_bytes().to_vec());

        ctx.emit_event(
            "recorded",
            vec![EventAttribute::new("payload", payload.to_vec())],
        )?;
        Ok(count.to_le_bytes().to_vec())
    }
}

/// Writes to storage, then always fails.
pub struct Reverter;

impl CallTarget for Reverter {
    fn on_call(
        &self,
        ctx: &mut CallContext<'_, '_>,
        _payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        ctx.storage_set(b"touched".to_vec(), vec![1]);
        Err(CallFailure::Reverted("always reverts".into()))
    }
}

/// Tries to submit a nested batch. Propagates the rejection unless
/// `swallow` is set.
pub struct Reentrant {
    pub swallow: bool,
}

impl CallTarget for Reentrant {
    fn on_call(
        &self,
        ctx: &mut CallContext<'_, '_>,
        _payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        let nested = [Call::transfer(ctx.address(), 0)];
        match ctx.submit_batch(&nested, 0) {
            Ok(_) => Ok(b"reentered".to_vec()),
            Err(_) if self.swallow => Ok(b"rejected".to_vec()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Returns the payload unchanged.
pub struct Echo;

impl CallTarget for Echo {
    fn on_call(
        &self,
        _ctx: &mut CallContext<'_, '_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        Ok(payload.to_vec())
    }
}

/// Refuses any call carrying value.
pub struct Vault;

impl CallTarget for Vault {
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

/// Forwards the value it received to the 20-byte address in the payload.
pub struct Forwarder;

impl CallTarget for Forwarder {
    fn on_call(
        &self,
        ctx: &mut CallContext<'_, '_>,
        payload: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        let to: Address = payload
            .try_into()
            .map_err(|_| CallFailure::Reverted("payload must be an address".into()))?;
        let value = ctx.value();
        ctx.transfer(to, value)?;
        Ok(Vec::new())
    }
}
