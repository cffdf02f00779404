//! Shared synthesizer trait and data structures.

use async_trait::async_trait;
use forge_primitives::ToolDefinition;
use thiserror::Error;

/// Result alias used by synthesizer implementations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Error type shared by synthesizer implementations.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Synthesizer is misconfigured or missing credentials.
    #[error("synthesizer not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The supplied synthesis request was invalid.
    #[error("invalid synthesis request: {reason}")]
    InvalidRequest {
        /// Reason describing why the request could not be processed.
        reason: String,
    },

    /// Transport-level failures (network, timeout, HTTP status).
    #[error("synthesizer transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The upstream reply could not be interpreted as a tool definition.
    #[error("invalid synthesizer response: {reason}")]
    InvalidResponse {
        /// Additional context about the response failure.
        reason: String,
    },

    /// The generated definition omitted required fields.
    #[error("generated tool is missing required fields: {fields}")]
    MissingFields {
        /// Comma-separated names of the absent or empty fields.
        fields: String,
    },
}

impl SynthesisError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for unusable upstream replies.
    #[must_use]
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// A caller's description of the capability a tool should provide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisRequest {
    description: String,
    example_input: Option<String>,
    example_output: Option<String>,
}

impl SynthesisRequest {
    /// Creates a request from a natural-language description.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::InvalidRequest`] when the description is
    /// blank.
    pub fn new(description: impl Into<String>) -> SynthesisResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(SynthesisError::invalid_request(
                "synthesis request requires a description",
            ));
        }

        Ok(Self {
            description,
            example_input: None,
            example_output: None,
        })
    }

    /// Attaches an example input to guide generation.
    #[must_use]
    pub fn with_example_input(mut self, example: impl Into<String>) -> Self {
        self.example_input = Some(example.into());
        self
    }

    /// Attaches an expected output shape to guide generation.
    #[must_use]
    pub fn with_example_output(mut self, example: impl Into<String>) -> Self {
        self.example_output = Some(example.into());
        self
    }

    /// Returns the capability description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the example input, if any.
    #[must_use]
    pub fn example_input(&self) -> Option<&str> {
        self.example_input.as_deref()
    }

    /// Returns the expected output shape, if any.
    #[must_use]
    pub fn example_output(&self) -> Option<&str> {
        self.example_output.as_deref()
    }
}

/// Trait implemented by tool synthesizers.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produces a complete, validated tool definition for the request.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthesisError`] when the upstream call fails or the
    /// reply cannot be interpreted as a tool definition.
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult<ToolDefinition>;
}
