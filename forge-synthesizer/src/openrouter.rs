//! OpenRouter-backed synthesizer calling a chat completion API over HTTPS.

use std::sync::Arc;
use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use forge_primitives::ToolDefinition;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Request, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info};
use webpki_roots::TLS_SERVER_ROOTS;

use crate::prompt::{SYSTEM_PROMPT, build_user_prompt};
use crate::traits::{SynthesisError, SynthesisRequest, SynthesisResult, Synthesizer};

/// Environment variable used when loading configuration automatically.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Model used when the configuration does not name one.
const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Configuration for the OpenRouter synthesizer.
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    max_tokens: u32,
}

impl OpenRouterConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: "https://openrouter.ai/".to_owned(),
            timeout: Duration::from_secs(60),
            max_tokens: 2048,
        }
    }

    /// Loads the API key from the `OPENROUTER_API_KEY` environment variable
    /// and uses the default model.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::new(DEFAULT_MODEL);
        cfg.api_key = env::var(OPENROUTER_API_KEY_ENV).ok();
        cfg
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Configuration`] if the supplied URL is
    /// invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> SynthesisResult<Self> {
        let sanitized = sanitize_base_url(base_url.as_ref())?;
        self.base_url = sanitized;
        Ok(self)
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the completion token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));
    Client::builder().build::<_, Body>(connector)
}

/// Synthesizer that calls an OpenRouter-compatible chat completion endpoint.
pub struct OpenRouterSynthesizer {
    client: HyperClient,
    endpoint: Uri,
    model: String,
    api_key: String,
    timeout: Duration,
    max_tokens: u32,
}

impl fmt::Debug for OpenRouterSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterSynthesizer")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenRouterSynthesizer {
    /// Constructs a synthesizer with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Configuration`] if the API key is missing
    /// or the endpoint cannot be built.
    pub fn new(config: OpenRouterConfig) -> SynthesisResult<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            SynthesisError::configuration("OpenRouter synthesizer requires an API key")
        })?;

        let endpoint = format!("{}api/v1/chat/completions", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                SynthesisError::configuration(format!("invalid OpenRouter endpoint: {err}"))
            })?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            model: config.model,
            api_key,
            timeout: config.timeout,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Synthesizer for OpenRouterSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult<ToolDefinition> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_prompt(request),
                },
            ],
            max_tokens: self.max_tokens,
        };

        let body = serde_json::to_vec(&payload).map_err(|err| {
            SynthesisError::invalid_request(format!("failed to encode synthesis request: {err}"))
        })?;

        let http_request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .body(Body::from(body))
            .map_err(|err| {
                SynthesisError::transport(format!("failed to build synthesis request: {err}"))
            })?;

        debug!(model = %self.model, "requesting tool synthesis");

        let response = timeout(self.timeout, self.client.request(http_request))
            .await
            .map_err(|_| SynthesisError::transport("synthesis request timed out"))?
            .map_err(|err| SynthesisError::transport(format!("synthesis request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            SynthesisError::transport(format!("failed to read synthesis response: {err}"))
        })?;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes).to_string();
            return Err(SynthesisError::transport(format!(
                "synthesizer returned {status}: {reason}"
            )));
        }

        let response: ChatCompletionResponse = serde_json::from_slice(&bytes).map_err(|err| {
            SynthesisError::invalid_response(format!("failed to decode completion: {err}"))
        })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SynthesisError::invalid_response("completion carried no content"))?;

        let tool = parse_generated_tool(&text)?;
        info!(tool = tool.name(), "tool definition synthesized");
        Ok(tool)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Fields as the model emitted them, before required-field validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawToolPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_schema: Option<Value>,
    #[serde(default)]
    handler_code: Option<String>,
}

/// Interprets completion text as a tool definition.
///
/// Models wrap JSON in prose more often than not, so the first `{` through
/// the last `}` is treated as the candidate payload.
fn parse_generated_tool(text: &str) -> SynthesisResult<ToolDefinition> {
    let block = extract_json_block(text)
        .ok_or_else(|| SynthesisError::invalid_response("completion contains no JSON object"))?;

    let raw: RawToolPayload = serde_json::from_str(block).map_err(|err| {
        SynthesisError::invalid_response(format!("completion is not a tool definition: {err}"))
    })?;

    let mut missing = Vec::new();
    if raw.name.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("name");
    }
    if raw
        .description
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        missing.push("description");
    }
    if raw.input_schema.is_none() {
        missing.push("inputSchema");
    }
    if raw
        .handler_code
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        missing.push("handlerCode");
    }
    if !missing.is_empty() {
        return Err(SynthesisError::MissingFields {
            fields: missing.join(", "),
        });
    }

    // Presence is checked; structural validation still applies.
    ToolDefinition::new(
        raw.name.unwrap_or_default(),
        raw.description.unwrap_or_default(),
        raw.input_schema.unwrap_or_default(),
        raw.handler_code.unwrap_or_default(),
    )
    .map_err(|err| SynthesisError::invalid_response(err.to_string()))
}

fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn sanitize_base_url(input: &str) -> SynthesisResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(SynthesisError::configuration(
            "OpenRouter base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>().map_err(|err| {
        SynthesisError::configuration(format!("invalid OpenRouter base URL: {err}"))
    })?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_requires_scheme() {
        let err = OpenRouterConfig::new("test-model")
            .with_base_url("openrouter.ai")
            .expect_err("missing scheme should error");
        assert!(matches!(err, SynthesisError::Configuration { .. }));
    }

    #[test]
    fn sanitize_appends_trailing_slash() {
        let cfg = OpenRouterConfig::new("test-model")
            .with_base_url("https://example.com/llm")
            .expect("valid URL");
        assert_eq!(cfg.base_url, "https://example.com/llm/");
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = OpenRouterSynthesizer::new(OpenRouterConfig::new("test-model"))
            .expect_err("no API key supplied");
        assert!(matches!(err, SynthesisError::Configuration { .. }));
    }

    #[test]
    fn parses_a_complete_definition() {
        let text = r#"Here is your tool:
{
  "name": "adder",
  "description": "Adds two numbers",
  "inputSchema": { "type": "object", "properties": {} },
  "handlerCode": "params.a + params.b"
}
Enjoy!"#;

        let tool = parse_generated_tool(text).expect("valid payload");
        assert_eq!(tool.name(), "adder");
        assert_eq!(tool.handler_code(), "params.a + params.b");
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let text = r#"{ "name": "adder", "inputSchema": {} }"#;
        let err = parse_generated_tool(text).expect_err("incomplete payload");
        match err {
            SynthesisError::MissingFields { fields } => {
                assert!(fields.contains("description"));
                assert!(fields.contains("handlerCode"));
                assert!(!fields.contains("name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_json_completion_is_invalid_response() {
        let err = parse_generated_tool("I could not do that.").expect_err("no JSON block");
        assert!(matches!(err, SynthesisError::InvalidResponse { .. }));
    }

    #[test]
    fn extracts_outermost_json_block() {
        assert_eq!(
            extract_json_block("before { \"a\": { \"b\": 1 } } after"),
            Some("{ \"a\": { \"b\": 1 } }")
        );
        assert!(extract_json_block("} reversed {").is_none());
        assert!(extract_json_block("plain text").is_none());
    }
}
