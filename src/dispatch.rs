//! Operation dispatch table.

use std::collections::HashMap;

/// What the manager does with a decoded operation
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// write the operation to log, emit nothing
    Log,
    /// emit a message event carrying the operation payload
    Emit,
}

/// Map from operation tag to [`Action`].
///
/// Operations without an entry are reported as unknown.
#[derive(Debug, Default, Clone)]
pub struct Dispatch {
    routes: HashMap<String, Action>,
}

impl Dispatch {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the action for `op`
    pub fn route<S: Into<String>>(mut self, op: S, action: Action) -> Self {
        self.routes.insert(op.into(), action);
        self
    }

    /// Find the action for `op`
    pub fn action(&self, op: &str) -> Option<Action> {
        self.routes.get(op).copied()
    }
}
