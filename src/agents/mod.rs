//! Specialist sub-agents. Each one pairs a capability tool with a
//! synthesis prompt: `propose_scope` derives a bounded action from user text
//! without any I/O, and `execute` runs exactly one tool call followed by one
//! model call once that action has been approved.

pub mod article;
pub mod blog;
pub mod repo;
pub mod research;

use std::fmt;
use std::sync::Arc;

use crate::llm::{LlmClient, LlmRequest};
use crate::tools::ToolError;

#[derive(Debug, Clone)]
pub struct SubAgentResult {
    pub agent: &'static str,
    pub source: String,
    pub summary: String,
}

/// Execution failure, split by which side of the agent broke: the capability
/// tool or the model backend.
#[derive(Debug)]
pub enum AgentFailure {
    Tool(ToolError),
    Backend(String),
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentFailure::Tool(e) => write!(f, "tool failure ({e})"),
            AgentFailure::Backend(msg) => write!(f, "backend unavailable: {msg}"),
        }
    }
}

impl std::error::Error for AgentFailure {}

impl From<ToolError> for AgentFailure {
    fn from(e: ToolError) -> Self {
        AgentFailure::Tool(e)
    }
}

pub(crate) async fn synthesize(
    model: &Arc<dyn LlmClient>,
    instruction: &str,
    payload: String,
) -> Result<String, AgentFailure> {
    let response = model
        .complete(LlmRequest::single(instruction, payload))
        .await
        .map_err(|e| AgentFailure::Backend(e.to_string()))?;
    Ok(response.content)
}

/// Cap a prompt payload so a large fetch cannot blow the model's context.
pub(crate) fn cap_payload(payload: String, max_chars: usize) -> String {
    if payload.chars().count() <= max_chars {
        return payload;
    }
    let mut out: String = payload.chars().take(max_chars).collect();
    out.push_str("\n... [input truncated]");
    out
}
