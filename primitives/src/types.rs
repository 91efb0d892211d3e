//! Core type aliases and constants for TxCompress batch execution.
//!
//! These types are shared by the engine, the host backend, and any
//! reporting layer that reads engine state.

use std::fmt::Write;

/// 20-byte account identity (invokers, targets, and the engine itself).
pub type Address = [u8; 20];

/// Value amount in the smallest currency unit.
pub type Amount = u128;

/// 32-byte digest used for batch identifiers.
pub type Hash = [u8; 32];

/// Maximum number of calls accepted in a single batch.
pub const MAX_BATCH_SIZE: usize = 100;

/// Smallest units per whole ether.
pub const WEI_PER_ETHER: Amount = 1_000_000_000_000_000_000;

/// Whole ether expressed in wei. Saturates at `Amount::MAX`.
pub fn ether(whole: u64) -> Amount {
    (whole as Amount).saturating_mul(WEI_PER_ETHER)
}

/// Thousandths of an ether expressed in wei (`milli_ether(500)` is 0.5 ETH).
pub fn milli_ether(thousandths: u64) -> Amount {
    (thousandths as Amount).saturating_mul(WEI_PER_ETHER / 1_000)
}

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for byte in bytes {
        let _ = write!(s, "{:02x}", byte);
    }
    s
}

/// Convenience wrapper around [`to_hex`] for addresses.
pub fn address_to_hex(addr: &Address) -> String {
    to_hex(addr)
}

/// Encode an amount as little-endian bytes.
pub fn amount_to_le_bytes(v: Amount) -> [u8; 16] {
    v.to_le_bytes()
}

/// Decode an amount from little-endian bytes.
pub fn amount_from_le_bytes(bytes: &[u8]) -> Option<Amount> {
    let buf: [u8; 16] = bytes.get(..16)?.try_into().ok()?;
    Some(Amount::from_le_bytes(buf))
}
