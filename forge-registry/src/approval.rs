//! In-memory staging area for definitions awaiting a human decision.

use std::collections::HashMap;
use std::sync::RwLock;

use forge_primitives::ToolDefinition;
use tracing::debug;

/// Holds synthesized tools until they are approved or rejected.
///
/// The queue is transient: pending definitions do not survive a process
/// restart. Each map operation is individually atomic, but there is no
/// cross-operation transaction; a concurrent approve and reject of the same
/// name race, and the loser observes absence.
#[derive(Default)]
pub struct ApprovalQueue {
    inner: RwLock<HashMap<String, ToolDefinition>>,
}

impl std::fmt::Debug for ApprovalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("approval queue poisoned");
        let names: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("ApprovalQueue")
            .field("pending", &names)
            .finish()
    }
}

impl ApprovalQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a definition, silently replacing any pending entry of the same
    /// name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add(&self, tool: ToolDefinition) {
        let mut inner = self.inner.write().expect("approval queue poisoned");
        debug!(tool = tool.name(), "tool staged for approval");
        inner.insert(tool.name().to_owned(), tool);
    }

    /// Removes and returns the pending definition for `name`.
    ///
    /// Approval is single-consumption: after a successful call the entry is
    /// no longer retrievable. Absence is a normal `None`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn approve(&self, name: &str) -> Option<ToolDefinition> {
        let mut inner = self.inner.write().expect("approval queue poisoned");
        let tool = inner.remove(name);
        if tool.is_some() {
            debug!(tool = name, "pending tool approved");
        }
        tool
    }

    /// Discards the pending definition for `name`, returning whether anything
    /// was removed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn reject(&self, name: &str) -> bool {
        let mut inner = self.inner.write().expect("approval queue poisoned");
        let removed = inner.remove(name).is_some();
        if removed {
            debug!(tool = name, "pending tool rejected");
        }
        removed
    }

    /// Returns a snapshot of all pending definitions, in no particular order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn list_pending(&self) -> Vec<ToolDefinition> {
        let inner = self.inner.read().expect("approval queue poisoned");
        inner.values().cloned().collect()
    }

    /// Returns the pending definition for `name` without consuming it.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolDefinition> {
        let inner = self.inner.read().expect("approval queue poisoned");
        inner.get(name).cloned()
    }
}
