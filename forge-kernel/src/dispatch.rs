//! Request and response types for the kernel's dispatch surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operations the dispatch surface accepts.
///
/// Arguments are assumed validated by the transport layer: names are
/// non-empty strings, params are structured values already checked against
/// the tool's schema.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Synthesize a new tool and stage it for approval.
    Synthesize {
        /// Natural-language description of the desired capability.
        description: String,
        /// Optional example input to guide generation.
        #[serde(default)]
        example_input: Option<String>,
        /// Optional expected output shape to guide generation.
        #[serde(default)]
        example_output: Option<String>,
    },
    /// List names of approved tools.
    List,
    /// Approve a pending tool, persisting it.
    Approve {
        /// Name of the pending tool.
        name: String,
    },
    /// Reject a pending tool, discarding it.
    Reject {
        /// Name of the pending tool.
        name: String,
    },
    /// Execute an approved tool against the supplied parameters.
    Execute {
        /// Name of the approved tool.
        name: String,
        /// Parameters passed to the handler.
        params: Value,
    },
    /// Fetch an approved tool's full definition.
    Get {
        /// Name of the approved tool.
        name: String,
    },
    /// Delete an approved tool.
    Remove {
        /// Name of the approved tool.
        name: String,
    },
    /// List tools awaiting approval.
    ListPending,
}

/// Discriminated outcome of a dispatched operation.
///
/// Every operation resolves to exactly one of these; dispatch never panics
/// and never surfaces a raw error type.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    /// The operation completed; `payload` carries its result.
    Success {
        /// Operation-specific result value.
        payload: Value,
    },
    /// The named tool was absent where the operation required it.
    NotFound {
        /// Name that could not be resolved.
        name: String,
    },
    /// The operation failed; `reason` describes the cause.
    Failure {
        /// Human-readable failure description.
        reason: String,
    },
}

impl ToolResponse {
    /// Creates a success response from the supplied payload.
    #[must_use]
    pub fn success(payload: Value) -> Self {
        Self::Success { payload }
    }

    /// Creates a not-found response for the supplied name.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a failure response from the supplied reason.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`ToolResponse::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
