//! Prompt construction for tool synthesis.

use crate::traits::SynthesisRequest;

/// System prompt instructing the model to emit one JSON tool definition.
///
/// The handler dialect rules mirror the sandbox's capability allow-list:
/// anything outside it does not exist at execution time, so the prompt
/// forbids reaching for it.
pub(crate) const SYSTEM_PROMPT: &str = r#"You are a tool generator. Given a description of a capability,
you produce a complete tool definition.

You MUST respond with valid JSON containing exactly these fields:

{
  "name": "snake_case_tool_name",
  "description": "Clear one-line description of what the tool does",
  "inputSchema": {
    "type": "object",
    "properties": {
      "param_name": { "type": "string|number|boolean|array|object", "description": "..." }
    },
    "required": ["param_name"]
  },
  "handlerCode": "... rhai script function body ..."
}

Rules for handlerCode:
- It is a rhai script body that receives a `params` object map matching the inputSchema
- It must be self-contained: no imports, no module access
- It has access to: arithmetic, math, string, array, and object-map functions,
  `parse_json`/`to_json`, `regex_is_match`/`regex_find`/`regex_replace`,
  and no-op `log`/`warn`/`error`
- It does NOT have access to: files, network, processes, environment, or `eval`
- It must return a value (object map, string, number, bool, or array),
  either with an explicit `return` or as the final expression
- Keep it focused and under 100 lines

Example - for "Calculate body mass index":
{
  "name": "bmi_calculator",
  "description": "Calculate BMI from weight (kg) and height (m)",
  "inputSchema": {
    "type": "object",
    "properties": {
      "weight_kg": { "type": "number", "description": "Weight in kilograms" },
      "height_m": { "type": "number", "description": "Height in meters" }
    },
    "required": ["weight_kg", "height_m"]
  },
  "handlerCode": "let bmi = params.weight_kg / (params.height_m * params.height_m); let category = if bmi < 18.5 { \"underweight\" } else if bmi < 25.0 { \"normal\" } else if bmi < 30.0 { \"overweight\" } else { \"obese\" }; #{ bmi: (bmi * 10.0).round() / 10.0, category: category }"
}"#;

/// Assembles the user prompt from the request and its optional examples.
pub(crate) fn build_user_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = format!("Generate a tool for: {}", request.description());
    if let Some(input) = request.example_input() {
        prompt.push_str("\n\nExample input: ");
        prompt.push_str(input);
    }
    if let Some(output) = request.example_output() {
        prompt.push_str("\nExpected output format: ");
        prompt.push_str(output);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_includes_examples_when_present() {
        let request = SynthesisRequest::new("Sum two numbers").unwrap();
        assert_eq!(
            build_user_prompt(&request),
            "Generate a tool for: Sum two numbers"
        );

        let request = request
            .with_example_input("{\"a\": 1}")
            .with_example_output("2");
        let prompt = build_user_prompt(&request);
        assert!(prompt.contains("Example input: {\"a\": 1}"));
        assert!(prompt.contains("Expected output format: 2"));
    }
}
