//! Batch boundary types: calls, outcomes, events, and the invocation
//! lifecycle.
//!
//! A caller hands the engine an ordered list of [`Call`]s and an attached
//! payment. The engine either commits all of them and returns a
//! [`BatchOutcome`], or aborts with a `BatchError` and no effect.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Hash};

/// One sub-operation of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Account or target logic receiving the call.
    pub target: Address,
    /// Value forwarded to the target.
    pub value: Amount,
    /// Payload for target logic. Empty means a plain value transfer.
    pub payload: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: Amount, payload: Vec<u8>) -> Self {
        Self {
            target,
            value,
            payload,
        }
    }

    /// A pure value transfer with no payload.
    pub fn transfer(target: Address, value: Amount) -> Self {
        Self::new(target, value, Vec::new())
    }

    /// Returns true if this call carries no payload.
    pub fn is_transfer(&self) -> bool {
        self.payload.is_empty()
    }
}

/// An ordered batch of calls. Position is execution order.
pub type Batch = Vec<Call>;

/// A batch packaged together with its invoker and attached payment, as
/// handed over by the submission mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub invoker: Address,
    pub attached_payment: Amount,
    pub calls: Batch,
}

/// Result of a single call within a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// Position of the call in the batch.
    pub index: u32,
    pub target: Address,
    pub value: Amount,
    /// Always true in a committed outcome; a failing call aborts the batch.
    pub success: bool,
    /// Bytes returned by target logic (empty for plain transfers).
    pub return_data: Vec<u8>,
}

/// Result of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Deterministic identifier of this batch.
    pub batch_id: Hash,
    pub invoker: Address,
    /// Per-call outcomes, in execution order.
    pub calls: Vec<CallOutcome>,
    /// Sum of all call values delivered.
    pub total_value: Amount,
    /// Excess payment returned to the invoker (zero under exact matching).
    pub refunded: Amount,
    /// Gas metered for this invocation.
    pub gas_used: u64,
    /// Gas saved versus submitting each call on its own.
    pub gas_saved: u64,
    /// Events published by this batch, in emission order.
    pub events: Vec<Event>,
}

impl BatchOutcome {
    /// Returns true if every call reported success.
    pub fn all_succeeded(&self) -> bool {
        self.calls.iter().all(|c| c.success)
    }
}

/// Emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Index of the call that produced this event, `None` for batch-level
    /// events.
    pub call_index: Option<u32>,
    /// Event type identifier.
    pub event_type: String,
    /// Key-value attributes.
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Look up an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_slice())
    }
}

/// A single key-value attribute within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    /// Attribute key (UTF-8).
    pub key: String,
    /// Attribute value (arbitrary bytes).
    pub value: Vec<u8>,
}

impl EventAttribute {
    pub fn new(key: &str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Lifecycle of one invocation.
///
/// `Validating → Executing → Settling → Committed`, with `Aborted` as the
/// single failure sink. Nothing is visible outside the invocation until
/// `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InvocationPhase {
    Validating = 0,
    Executing = 1,
    Settling = 2,
    Committed = 3,
    Aborted = 4,
}

impl InvocationPhase {
    /// Returns true for `Committed` and `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Validating, Self::Executing)
                | (Self::Executing, Self::Settling)
                | (Self::Settling, Self::Committed)
                | (Self::Validating, Self::Aborted)
                | (Self::Executing, Self::Aborted)
                | (Self::Settling, Self::Aborted)
        )
    }
}

impl std::fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "VALIDATING",
            Self::Executing => "EXECUTING",
            Self::Settling => "SETTLING",
            Self::Committed => "COMMITTED",
            Self::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}
