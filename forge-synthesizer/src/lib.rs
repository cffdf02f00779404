//! Natural-language-to-tool-definition synthesis.
//!
//! The kernel treats synthesis as an opaque producer of validated
//! [`ToolDefinition`](forge_primitives::ToolDefinition) values behind the
//! [`Synthesizer`] trait. The bundled implementation calls an
//! OpenRouter-compatible chat completion API over HTTPS.

#![warn(missing_docs, clippy::pedantic)]

mod openrouter;
mod prompt;
mod traits;

pub use openrouter::{OPENROUTER_API_KEY_ENV, OpenRouterConfig, OpenRouterSynthesizer};
pub use traits::{SynthesisError, SynthesisRequest, SynthesisResult, Synthesizer};
