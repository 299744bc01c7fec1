//! Core of the prompt bridge: routes a natural-language prompt to an LLM,
//! optionally to a GitHub MCP Tool Server, and merges the two answers.

pub mod catalog;
pub mod config;
pub mod error;
pub mod intent;
pub mod llm;
pub mod merge;
pub mod mock;
pub mod model;
pub mod orchestrator;
pub mod tool_gateway;

pub use config::Settings;
pub use error::{LlmError, OrchestratorError};
pub use intent::{IntentClassifier, KeywordSet, Operation, OperationRouter};
pub use llm::{Brain, ChatModel, Completion};
pub use model::{
    PromptRequest, PromptResponse, ResponseStatus, ToolCatalogEntry, ToolFailure, ToolPayload,
    ToolQuery, ToolResult,
};
pub use orchestrator::PromptOrchestrator;
pub use tool_gateway::{McpClient, ToolGateway};
