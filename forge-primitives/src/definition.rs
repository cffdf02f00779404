//! The unit of value moved through the tool lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A synthesized tool: name, description, parameter schema, and handler body.
///
/// Definitions are produced by the synthesizer, staged for human approval,
/// persisted on approval, and executed in the sandbox. The persisted wire
/// format carries exactly the four fields below using their camelCase names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
    handler_code: String,
}

impl ToolDefinition {
    /// Creates a definition from its four required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] when `name`, `description`, or
    /// `handler_code` is blank, or when `input_schema` is not a JSON object.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler_code: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_definition("tool name cannot be empty"));
        }

        let description = description.into();
        if description.trim().is_empty() {
            return Err(Error::invalid_definition(
                "tool description cannot be empty",
            ));
        }

        if !input_schema.is_object() {
            return Err(Error::invalid_definition(
                "input schema must be a JSON object",
            ));
        }

        let handler_code = handler_code.into();
        if handler_code.trim().is_empty() {
            return Err(Error::invalid_definition("handler code cannot be empty"));
        }

        Ok(Self {
            name,
            description,
            input_schema,
            handler_code,
        })
    }

    /// Returns the unique tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameter schema.
    ///
    /// The schema is advisory: parameter validation is the dispatch layer's
    /// contract, not enforced by the store or the sandbox.
    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the handler source text.
    #[must_use]
    pub fn handler_code(&self) -> &str {
        &self.handler_code
    }
}
