//! Core value types: tokens and payloads. Domain-agnostic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Next token id, shared by every dispatcher in the process.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one registered handler.
///
/// Tokens are issued from a process-wide counter, so they are unique across
/// dispatchers and never reused, even after the registration is removed.
/// Ordering follows issue order, which is also registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchToken(u64);

impl DispatchToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

impl From<&DispatchToken> for DispatchToken {
    fn from(token: &DispatchToken) -> Self {
        *token
    }
}

/// What every handler receives for one dispatch pass.
///
/// Built fresh by `dispatch` and dropped when the pass ends. Handlers only
/// ever see it by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload<V = serde_json::Value> {
    pub action_type: String,
    pub value: V,
}

impl<V> Payload<V> {
    pub fn new(action_type: impl Into<String>, value: V) -> Self {
        Self {
            action_type: action_type.into(),
            value,
        }
    }

    /// True when this payload was dispatched under `action_type`.
    pub fn is(&self, action_type: &str) -> bool {
        self.action_type == action_type
    }
}
