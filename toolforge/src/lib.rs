//! Just-in-time tool synthesis runtime facade.
//!
//! Depend on this crate via `cargo add toolforge`. It bundles the runtime
//! crates behind feature flags so downstream users can enable or disable
//! components as needed: an LLM-backed synthesizer produces tool definitions
//! from natural-language descriptions, a human approves or rejects them, and
//! approved tools persist to disk and execute inside a capability-limited
//! sandbox.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use forge_primitives as primitives;

/// Lifecycle coordinator and dispatch surface (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use forge_kernel as kernel;

/// Approval queue and durable tool store (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use forge_registry as registry;

/// Capability-limited handler execution (enabled by `sandbox` feature).
#[cfg(feature = "sandbox")]
pub use forge_sandbox as sandbox;

/// Natural-language tool synthesis (enabled by `synthesizer` feature).
#[cfg(feature = "synthesizer")]
pub use forge_synthesizer as synthesizer;
