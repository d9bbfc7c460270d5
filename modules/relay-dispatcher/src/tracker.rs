//! Per-pass bookkeeping of which handlers have started and finished.

use std::collections::HashSet;

use crate::types::DispatchToken;

/// Where a handler stands within the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// Not invoked yet this pass.
    Idle,
    /// Invoked and still on the call stack.
    Pending,
    /// Invoked and returned.
    Handled,
}

/// Pending/handled sets for one dispatch pass.
///
/// Only meaningful while a pass is active; `reset` at the start of every
/// pass. A token is never handled without also being pending.
#[derive(Debug, Default)]
pub(crate) struct InvocationTracker {
    pending: HashSet<DispatchToken>,
    handled: HashSet<DispatchToken>,
}

impl InvocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything from the previous pass.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.handled.clear();
    }

    pub fn mark_pending(&mut self, token: DispatchToken) {
        self.pending.insert(token);
    }

    pub fn mark_handled(&mut self, token: DispatchToken) {
        debug_assert!(self.pending.contains(&token), "{token} handled before pending");
        self.handled.insert(token);
    }

    pub fn progress(&self, token: DispatchToken) -> Progress {
        match (self.pending.contains(&token), self.handled.contains(&token)) {
            (_, true) => Progress::Handled,
            (true, false) => Progress::Pending,
            (false, false) => Progress::Idle,
        }
    }

    pub fn is_pending(&self, token: DispatchToken) -> bool {
        self.pending.contains(&token)
    }
}
