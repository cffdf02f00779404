//! Tool lifecycle coordinator.
//!
//! [`ToolKernel`] wires the approval queue, the durable store, the sandbox,
//! and a synthesizer into the pending → active → removed lifecycle. All four
//! collaborators are explicitly constructed values passed in at build time,
//! so tests run against isolated instances.

#![warn(missing_docs, clippy::pedantic)]

mod dispatch;
mod lifecycle;

use std::sync::Arc;

use forge_primitives::ToolDefinition;
use forge_registry::{ApprovalQueue, RegistryError, ToolStore};
use forge_sandbox::{Sandbox, SandboxError};
use forge_synthesizer::{SynthesisError, SynthesisRequest, Synthesizer};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

pub use dispatch::{ToolRequest, ToolResponse};
pub use lifecycle::{LifecycleError, LifecycleResult, ToolEvent, ToolState};

/// Errors surfaced by kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The persistence layer failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The synthesizer failed to produce a definition.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Handler execution failed inside the sandbox.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// A lifecycle transition was not permitted.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Coordinates the tool lifecycle across its collaborators.
pub struct ToolKernel {
    store: Arc<ToolStore>,
    approvals: Arc<ApprovalQueue>,
    sandbox: Arc<Sandbox>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl std::fmt::Debug for ToolKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolKernel")
            .field("store", &self.store.dir())
            .field("approvals", &self.approvals)
            .finish_non_exhaustive()
    }
}

impl ToolKernel {
    /// Creates a kernel over the provided collaborators.
    #[must_use]
    pub fn new(
        store: Arc<ToolStore>,
        approvals: Arc<ApprovalQueue>,
        sandbox: Arc<Sandbox>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            store,
            approvals,
            sandbox,
            synthesizer,
        }
    }

    /// Returns the approval queue.
    #[must_use]
    pub fn approvals(&self) -> &ApprovalQueue {
        &self.approvals
    }

    /// Returns the durable store.
    #[must_use]
    pub fn store(&self) -> &ToolStore {
        &self.store
    }

    /// Synthesizes a tool for the request and stages it for approval.
    ///
    /// A pending entry of the same name is silently replaced; an active tool
    /// of the same name is untouched until a later approval overwrites it.
    ///
    /// # Errors
    ///
    /// Propagates synthesizer failures.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> KernelResult<ToolDefinition> {
        let tool = self.synthesizer.synthesize(request).await?;
        info!(tool = tool.name(), "synthesized tool staged for approval");
        self.approvals.add(tool.clone());
        Ok(tool)
    }

    /// Approves the pending tool `name`, persisting it to the store.
    ///
    /// Returns `None` when nothing by that name is pending. Approval is
    /// single-consumption; the entry is gone from the queue afterward.
    ///
    /// # Errors
    ///
    /// Propagates store failures. A failed save leaves the tool neither
    /// pending nor stored; the caller must re-synthesize.
    pub async fn approve(&self, name: &str) -> KernelResult<Option<ToolDefinition>> {
        let Some(tool) = self.approvals.approve(name) else {
            return Ok(None);
        };

        let state = ToolState::Pending.transition(ToolEvent::Approve)?;
        self.store.save(&tool).await?;
        info!(tool = name, %state, "tool approved and persisted");
        Ok(Some(tool))
    }

    /// Rejects the pending tool `name`, returning whether it was present.
    pub fn reject(&self, name: &str) -> bool {
        let rejected = self.approvals.reject(name);
        if rejected {
            info!(tool = name, state = %ToolState::Rejected, "pending tool discarded");
        }
        rejected
    }

    /// Executes the approved tool `name` against `params`.
    ///
    /// Returns `None` when no such tool is stored.
    ///
    /// # Errors
    ///
    /// Propagates store failures and normalized execution failures.
    pub async fn execute(&self, name: &str, params: Value) -> KernelResult<Option<Value>> {
        let Some(tool) = self.store.load(name).await? else {
            return Ok(None);
        };

        let result = self.sandbox.execute(tool.handler_code(), params).await?;
        Ok(Some(result))
    }

    /// Returns the stored definition for `name`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including corrupt records.
    pub async fn get(&self, name: &str) -> KernelResult<Option<ToolDefinition>> {
        Ok(self.store.load(name).await?)
    }

    /// Deletes the stored tool `name`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn remove(&self, name: &str) -> KernelResult<bool> {
        let removed = self.store.remove(name).await?;
        if removed {
            let state = ToolState::Active.transition(ToolEvent::Remove)?;
            info!(tool = name, %state, "tool removed from store");
        }
        Ok(removed)
    }

    /// Lists names of approved tools.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list(&self) -> KernelResult<Vec<String>> {
        Ok(self.store.list().await?)
    }

    /// Returns a snapshot of tools awaiting approval.
    #[must_use]
    pub fn list_pending(&self) -> Vec<ToolDefinition> {
        self.approvals.list_pending()
    }

    /// Dispatches a request to the matching operation.
    ///
    /// This is the transport-facing surface: every outcome, including
    /// synthesis failures and execution errors, resolves to a
    /// [`ToolResponse`], never a panic or a raw error.
    pub async fn dispatch(&self, request: ToolRequest) -> ToolResponse {
        match request {
            ToolRequest::Synthesize {
                description,
                example_input,
                example_output,
            } => self
                .dispatch_synthesize(description, example_input, example_output)
                .await,
            ToolRequest::List => match self.list().await {
                Ok(tools) => ToolResponse::success(json!({ "tools": tools })),
                Err(err) => ToolResponse::failure(err.to_string()),
            },
            ToolRequest::Approve { name } => match self.approve(&name).await {
                Ok(Some(tool)) => ToolResponse::success(json!({
                    "tool": tool.name(),
                    "state": ToolState::Active,
                })),
                Ok(None) => ToolResponse::not_found(name),
                Err(err) => ToolResponse::failure(err.to_string()),
            },
            ToolRequest::Reject { name } => {
                if self.reject(&name) {
                    ToolResponse::success(json!({
                        "tool": name,
                        "state": ToolState::Rejected,
                    }))
                } else {
                    ToolResponse::not_found(name)
                }
            }
            ToolRequest::Execute { name, params } => match self.execute(&name, params).await {
                Ok(Some(result)) => ToolResponse::success(result),
                Ok(None) => ToolResponse::not_found(name),
                Err(err) => ToolResponse::failure(err.to_string()),
            },
            ToolRequest::Get { name } => match self.get(&name).await {
                Ok(Some(tool)) => match serde_json::to_value(&tool) {
                    Ok(payload) => ToolResponse::success(payload),
                    Err(err) => ToolResponse::failure(err.to_string()),
                },
                Ok(None) => ToolResponse::not_found(name),
                Err(err) => ToolResponse::failure(err.to_string()),
            },
            ToolRequest::Remove { name } => match self.remove(&name).await {
                Ok(true) => ToolResponse::success(json!({
                    "tool": name,
                    "state": ToolState::Removed,
                })),
                Ok(false) => ToolResponse::not_found(name),
                Err(err) => ToolResponse::failure(err.to_string()),
            },
            ToolRequest::ListPending => {
                let pending: Vec<Value> = self
                    .list_pending()
                    .into_iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name(),
                            "description": tool.description(),
                        })
                    })
                    .collect();
                ToolResponse::success(json!({ "pending": pending }))
            }
        }
    }

    async fn dispatch_synthesize(
        &self,
        description: String,
        example_input: Option<String>,
        example_output: Option<String>,
    ) -> ToolResponse {
        let mut request = match SynthesisRequest::new(description) {
            Ok(request) => request,
            Err(err) => return ToolResponse::failure(err.to_string()),
        };
        if let Some(example) = example_input {
            request = request.with_example_input(example);
        }
        if let Some(example) = example_output {
            request = request.with_example_output(example);
        }

        match self.synthesize(&request).await {
            Ok(tool) => ToolResponse::success(json!({
                "state": ToolState::Pending,
                "tool": {
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.input_schema(),
                },
                "message": format!(
                    "Tool `{}` generated. Approve it to make it executable.",
                    tool.name()
                ),
            })),
            Err(err) => ToolResponse::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use forge_sandbox::SandboxConfig;
    use forge_synthesizer::SynthesisResult;
    use serde_json::json;
    use uuid::Uuid;

    struct CannedSynthesizer {
        tool: ToolDefinition,
    }

    #[async_trait]
    impl Synthesizer for CannedSynthesizer {
        async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult<ToolDefinition> {
            Ok(self.tool.clone())
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult<ToolDefinition> {
            Err(SynthesisError::transport("connection refused"))
        }
    }

    fn adder_tool() -> ToolDefinition {
        ToolDefinition::new(
            "add_numbers",
            "Adds two numbers",
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"]
            }),
            "return params.a + params.b;",
        )
        .unwrap()
    }

    async fn kernel_with(synthesizer: Arc<dyn Synthesizer>) -> ToolKernel {
        let dir = std::env::temp_dir().join(format!("forge-kernel-{}", Uuid::new_v4()));
        let store = ToolStore::open(dir).await.unwrap();
        ToolKernel::new(
            Arc::new(store),
            Arc::new(ApprovalQueue::new()),
            Arc::new(Sandbox::new(SandboxConfig::new())),
            synthesizer,
        )
    }

    #[tokio::test]
    async fn synthesize_stages_tool_as_pending() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();

        let tool = kernel.synthesize(&request).await.unwrap();

        assert_eq!(tool.name(), "add_numbers");
        assert_eq!(kernel.list_pending().len(), 1);
        assert!(kernel.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approve_persists_and_consumes_pending_entry() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();
        kernel.synthesize(&request).await.unwrap();

        let approved = kernel.approve("add_numbers").await.unwrap();

        assert!(approved.is_some());
        assert!(kernel.list_pending().is_empty());
        assert_eq!(kernel.list().await.unwrap(), vec!["add_numbers".to_string()]);
    }

    #[tokio::test]
    async fn approve_of_unknown_name_is_none() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;

        assert!(kernel.approve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reject_discards_without_persisting() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();
        kernel.synthesize(&request).await.unwrap();

        assert!(kernel.reject("add_numbers"));
        assert!(!kernel.reject("add_numbers"));
        assert!(kernel.list_pending().is_empty());
        assert!(kernel.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn execute_runs_approved_handler() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();
        kernel.synthesize(&request).await.unwrap();
        kernel.approve("add_numbers").await.unwrap();

        let result = kernel
            .execute("add_numbers", json!({ "a": 2, "b": 3 }))
            .await
            .unwrap();

        assert_eq!(result, Some(json!(5)));
    }

    #[tokio::test]
    async fn execute_of_unknown_tool_is_none() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;

        let result = kernel.execute("missing", json!({})).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn pending_tool_is_not_executable() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();
        kernel.synthesize(&request).await.unwrap();

        let result = kernel.execute("add_numbers", json!({})).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn remove_deletes_stored_tool() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;
        let request = SynthesisRequest::new("add two numbers").unwrap();
        kernel.synthesize(&request).await.unwrap();
        kernel.approve("add_numbers").await.unwrap();

        assert!(kernel.remove("add_numbers").await.unwrap());
        assert!(!kernel.remove("add_numbers").await.unwrap());
        assert!(kernel.get("add_numbers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dispatch_reports_synthesis_failure() {
        let kernel = kernel_with(Arc::new(FailingSynthesizer)).await;

        let response = kernel
            .dispatch(ToolRequest::Synthesize {
                description: "add two numbers".into(),
                example_input: None,
                example_output: None,
            })
            .await;

        assert!(matches!(response, ToolResponse::Failure { .. }));
    }

    #[tokio::test]
    async fn dispatch_reports_missing_tool_as_not_found() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;

        let response = kernel
            .dispatch(ToolRequest::Execute {
                name: "missing".into(),
                params: json!({}),
            })
            .await;

        assert_eq!(
            response,
            ToolResponse::NotFound {
                name: "missing".into()
            }
        );
    }

    #[tokio::test]
    async fn dispatch_surfaces_execution_failure_reason() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer {
            tool: ToolDefinition::new(
                "boom",
                "Always fails",
                json!({ "type": "object" }),
                "throw \"handler exploded\";",
            )
            .unwrap(),
        }))
        .await;
        let request = SynthesisRequest::new("a failing tool").unwrap();
        kernel.synthesize(&request).await.unwrap();
        kernel.approve("boom").await.unwrap();

        let response = kernel
            .dispatch(ToolRequest::Execute {
                name: "boom".into(),
                params: json!({}),
            })
            .await;

        let ToolResponse::Failure { reason } = response else {
            panic!("expected failure response");
        };
        assert!(reason.contains("handler exploded"));
    }

    #[tokio::test]
    async fn dispatch_synthesize_reports_pending_state() {
        let kernel = kernel_with(Arc::new(CannedSynthesizer { tool: adder_tool() })).await;

        let response = kernel
            .dispatch(ToolRequest::Synthesize {
                description: "add two numbers".into(),
                example_input: Some("{\"a\": 1, \"b\": 2}".into()),
                example_output: Some("3".into()),
            })
            .await;

        let ToolResponse::Success { payload } = response else {
            panic!("expected success response");
        };
        assert_eq!(payload["state"], json!("pending"));
        assert_eq!(payload["tool"]["name"], json!("add_numbers"));
    }
}
