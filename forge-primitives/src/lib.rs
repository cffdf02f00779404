//! Core shared types for the toolforge runtime.

#![warn(missing_docs, clippy::pedantic)]

mod definition;
mod error;

/// Synthesized tool definitions and validation.
pub use definition::ToolDefinition;
/// Error type and result alias shared across the runtime.
pub use error::{Error, Result};
