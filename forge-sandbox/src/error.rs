//! Error type for sandboxed execution.

use thiserror::Error;

/// Result alias for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Errors emitted by the execution sandbox.
///
/// Every failure mode (compile error, runtime exception, budget expiry, a
/// wedged worker) is normalized into the single [`Execution`] variant so
/// that no underlying engine error type escapes the sandbox boundary.
///
/// [`Execution`]: SandboxError::Execution
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Handler execution failed.
    #[error("execution failed: {reason}")]
    Execution {
        /// Human-readable cause of the failure.
        reason: String,
    },
}

impl SandboxError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Execution { reason } => reason,
        }
    }
}
