//! Walks a tool through its whole lifecycle with a canned synthesizer.
//!
//! Swap `CannedSynthesizer` for `OpenRouterSynthesizer::new(OpenRouterConfig::from_env())?`
//! to generate tools from a live model (requires `OPENROUTER_API_KEY`).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use toolforge::kernel::ToolKernel;
use toolforge::primitives::ToolDefinition;
use toolforge::registry::{ApprovalQueue, ToolStore};
use toolforge::sandbox::{Sandbox, SandboxConfig};
use toolforge::synthesizer::{SynthesisRequest, SynthesisResult, Synthesizer};
use tracing::info;
use uuid::Uuid;

struct CannedSynthesizer;

#[async_trait]
impl Synthesizer for CannedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult<ToolDefinition> {
        info!("synthesizing tool for: {}", request.description());
        let tool = ToolDefinition::new(
            "word_count",
            "Counts the words in a piece of text",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to count words in" }
                },
                "required": ["text"]
            }),
            "return #{ words: params.text.split(\" \").filter(|w| w != \"\").len() };",
        )
        .map_err(|err| toolforge::synthesizer::SynthesisError::invalid_response(err.to_string()))?;
        Ok(tool)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let dir = std::env::temp_dir().join(format!("toolforge-demo-{}", Uuid::new_v4()));
    let store = ToolStore::open(&dir).await?;
    let kernel = ToolKernel::new(
        Arc::new(store),
        Arc::new(ApprovalQueue::new()),
        Arc::new(Sandbox::new(SandboxConfig::new())),
        Arc::new(CannedSynthesizer),
    );

    // 1. Synthesize from a natural-language description.
    let request = SynthesisRequest::new("count the words in a string of text")?;
    let tool = kernel.synthesize(&request).await?;
    info!("pending tool: {} ({})", tool.name(), tool.description());

    // 2. A human reviews the pending definition.
    for pending in kernel.list_pending() {
        info!("awaiting approval: {}", pending.name());
        info!("handler:\n{}", pending.handler_code());
    }

    // 3. Approve it, persisting the definition to disk.
    kernel.approve("word_count").await?;
    info!("approved tools: {:?}", kernel.list().await?);

    // 4. Execute it as many times as needed.
    for text in ["the quick brown fox", "hello world"] {
        if let Some(result) = kernel
            .execute("word_count", json!({ "text": text }))
            .await?
        {
            info!("{text:?} -> {result}");
        }
    }

    // 5. Retire it.
    kernel.remove("word_count").await?;
    info!("removed; tools now: {:?}", kernel.list().await?);

    Ok(())
}
