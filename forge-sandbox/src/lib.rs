//! Capability-restricted execution of synthesized tool handlers.
//!
//! Handler bodies are rhai script wrapped into a single-parameter function
//! and run on a freshly built engine per call. The engine starts raw and
//! gains only an enumerated allow-list of capabilities; filesystem, network,
//! process, and dynamic evaluation surfaces simply do not exist in it.

#![warn(missing_docs, clippy::pedantic)]

mod capabilities;
mod error;
mod sandbox;

pub use error::{SandboxError, SandboxResult};
pub use sandbox::{Sandbox, SandboxConfig};
