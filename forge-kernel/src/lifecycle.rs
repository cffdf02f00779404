//! Lifecycle state machine for synthesized tools.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Discrete states a tool definition can occupy during its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolState {
    /// Staged in the approval queue, awaiting a human decision.
    Pending,
    /// Approved and persisted; available for execution.
    Active,
    /// Discarded before approval; no artifact remains.
    Rejected,
    /// Deleted from the store after having been active.
    Removed,
}

impl ToolState {
    /// Returns `true` when the state represents an executable tool.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` for states no further event can leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Removed)
    }

    /// Returns the lowercase wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Removed => "removed",
        }
    }

    /// Applies a lifecycle event, returning the resulting state.
    ///
    /// A later approval of the same name overwrites an active tool, which is
    /// why `Active` accepts `Approve` again.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(self, event: ToolEvent) -> LifecycleResult<Self> {
        let next = match (self, event) {
            (Self::Pending | Self::Active, ToolEvent::Approve) => Some(Self::Active),
            (Self::Pending, ToolEvent::Reject) => Some(Self::Rejected),
            (Self::Active, ToolEvent::Remove) => Some(Self::Removed),
            _ => None,
        };

        let Some(next_state) = next else {
            return Err(LifecycleError::InvalidTransition { from: self, event });
        };

        if next_state != self {
            debug!(from = %self, to = %next_state, ?event, "tool lifecycle transition");
        }
        Ok(next_state)
    }
}

impl fmt::Display for ToolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that trigger lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    /// A human approved the staged definition.
    Approve,
    /// A human rejected the staged definition.
    Reject,
    /// The persisted definition was deleted.
    Remove,
}

/// Errors emitted by the lifecycle state machine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Transition was not permitted from the current state.
    #[error("invalid tool lifecycle transition from {from} via {event:?}")]
    InvalidTransition {
        /// State prior to the attempted transition.
        from: ToolState,
        /// Event that triggered the failure.
        event: ToolEvent,
    },
}

/// Result alias used for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_resolves_to_active_or_rejected() {
        assert_eq!(
            ToolState::Pending.transition(ToolEvent::Approve).unwrap(),
            ToolState::Active
        );
        assert_eq!(
            ToolState::Pending.transition(ToolEvent::Reject).unwrap(),
            ToolState::Rejected
        );
    }

    #[test]
    fn active_allows_overwrite_and_removal() {
        assert_eq!(
            ToolState::Active.transition(ToolEvent::Approve).unwrap(),
            ToolState::Active
        );
        assert_eq!(
            ToolState::Active.transition(ToolEvent::Remove).unwrap(),
            ToolState::Removed
        );
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for state in [ToolState::Rejected, ToolState::Removed] {
            assert!(state.is_terminal());
            for event in [ToolEvent::Approve, ToolEvent::Reject, ToolEvent::Remove] {
                let err = state.transition(event).expect_err("terminal state");
                assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn rejecting_an_active_tool_is_invalid() {
        let err = ToolState::Active
            .transition(ToolEvent::Reject)
            .expect_err("active tools are not rejectable");
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }
}
