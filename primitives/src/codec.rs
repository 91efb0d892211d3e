//! Deterministic binary encoding for the submission boundary.
//!
//! The submission mechanism hands the engine a packaged invocation as bytes;
//! the same encoding of the call list feeds the batch identifier.
//!
//! Encoding format (all integers little-endian):
//! - `Address` is written as its 20 raw bytes
//! - `Amount` is a 16-byte `u128`, sequence numbers are 8-byte `u64`
//! - Payloads are length-prefixed (`u32`)
//! - The call list is count-prefixed (`u32`) then concatenated
//!
//! A payload or call list longer than `u32::MAX` cannot be framed; encoding
//! it fails with `Malformed` instead of truncating the prefix.
//!
//! ```text
//! SubmitRequest = invoker(20) attached_payment(16) count(4) Call*
//! Call          = target(20) value(16) payload_len(4) payload
//! ```

use crate::call::{Call, SubmitRequest};
use crate::error::{BatchError, InvalidBatchReason};
use crate::types::{Address, Amount, Hash, MAX_BATCH_SIZE};

/// Domain separator for batch identifiers.
const BATCH_ID_DOMAIN: &[u8] = b"txcompress/batch/v1";

/// A cursor for reading bytes during decoding.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], BatchError> {
        if n > self.remaining() {
            return Err(malformed("unexpected end of data"));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BatchError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    fn read_u32(&mut self) -> Result<u32, BatchError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_amount(&mut self) -> Result<Amount, BatchError> {
        Ok(Amount::from_le_bytes(self.read_array()?))
    }

    fn read_address(&mut self) -> Result<Address, BatchError> {
        self.read_array()
    }

    fn read_var_bytes(&mut self) -> Result<Vec<u8>, BatchError> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn finish(self) -> Result<(), BatchError> {
        if self.remaining() != 0 {
            return Err(malformed("trailing bytes after submission"));
        }
        Ok(())
    }
}

fn malformed(msg: &str) -> BatchError {
    BatchError::InvalidBatch(InvalidBatchReason::Malformed(msg.into()))
}

// ── Encoding helpers ──

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<(), BatchError> {
    let len = u32::try_from(len).map_err(|_| malformed("length exceeds u32 prefix"))?;
    write_u32(buf, len);
    Ok(())
}

fn write_amount(buf: &mut Vec<u8>, v: Amount) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) -> Result<(), BatchError> {
    write_len(buf, data.len())?;
    buf.extend_from_slice(data);
    Ok(())
}

// ── Calls ──

/// Append the encoding of an ordered call list to `buf`.
pub fn encode_calls(buf: &mut Vec<u8>, calls: &[Call]) -> Result<(), BatchError> {
    write_len(buf, calls.len())?;
    for call in calls {
        buf.extend_from_slice(&call.target);
        write_amount(buf, call.value);
        write_var_bytes(buf, &call.payload)?;
    }
    Ok(())
}

fn decode_calls(r: &mut Reader<'_>) -> Result<Vec<Call>, BatchError> {
    let count = r.read_u32()? as usize;
    // Oversized batches are rejected by validation, not here; only the
    // preallocation is capped.
    let mut calls = Vec::with_capacity(count.min(MAX_BATCH_SIZE + 1));
    for _ in 0..count {
        let target = r.read_address()?;
        let value = r.read_amount()?;
        let payload = r.read_var_bytes()?;
        calls.push(Call {
            target,
            value,
            payload,
        });
    }
    Ok(calls)
}

// ── SubmitRequest ──

/// Encode a `SubmitRequest` to deterministic bytes.
pub fn encode_submit_request(req: &SubmitRequest) -> Result<Vec<u8>, BatchError> {
    let payload_bytes: usize = req.calls.iter().map(|c| c.payload.len()).sum();
    let mut buf = Vec::with_capacity(40 + req.calls.len() * 40 + payload_bytes);

    buf.extend_from_slice(&req.invoker);
    write_amount(&mut buf, req.attached_payment);
    encode_calls(&mut buf, &req.calls)?;

    Ok(buf)
}

/// Decode a `SubmitRequest`. Truncated or trailing data is `Malformed`.
pub fn decode_submit_request(data: &[u8]) -> Result<SubmitRequest, BatchError> {
    let mut r = Reader::new(data);

    let invoker = r.read_address()?;
    let attached_payment = r.read_amount()?;
    let calls = decode_calls(&mut r)?;
    r.finish()?;

    Ok(SubmitRequest {
        invoker,
        attached_payment,
        calls,
    })
}

// ── Batch identifiers ──

/// BLAKE3 identifier of a batch.
///
/// `sequence` is the invoker's committed batch count before this batch, so
/// resubmitting identical calls still yields a fresh identifier.
pub fn batch_id(invoker: &Address, sequence: u64, calls: &[Call]) -> Result<Hash, BatchError> {
    let mut buf = Vec::with_capacity(BATCH_ID_DOMAIN.len() + 28 + calls.len() * 40);
    buf.extend_from_slice(BATCH_ID_DOMAIN);
    buf.extend_from_slice(invoker);
    buf.extend_from_slice(&sequence.to_le_bytes());
    encode_calls(&mut buf, calls)?;
    Ok(*blake3::hash(&buf).as_bytes())
}
