use async_openai::error::OpenAIError;
use thiserror::Error;

/// Failures talking to the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("LLM provider error: {0}")]
    Provider(#[from] OpenAIError),

    #[error("LLM returned no text content")]
    EmptyCompletion,

    #[error("LLM error: {0}")]
    Other(String),
}

/// Anything that aborts a prompt. Tool Server trouble is normally absorbed
/// into a `ToolResult::Failure`; the `ToolGateway` variant is for gateways
/// that could not even produce one.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Failed to process prompt with AI MCP integration: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to process prompt with AI MCP integration: {0:#}")]
    ToolGateway(anyhow::Error),
}
