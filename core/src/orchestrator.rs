//! Prompt orchestration: ask the model, consult the Tool Server when the
//! prompt calls for it, and fold the two answers together.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::OrchestratorError;
use crate::intent::IntentClassifier;
use crate::llm::ChatModel;
use crate::merge::merge_tool_data;
use crate::model::{PromptRequest, PromptResponse, ToolCatalogEntry};
use crate::tool_gateway::ToolGateway;

const PREAMBLE: &str = "\
You are an AI assistant with access to GitHub tools through MCP (Model Context Protocol).
You can help with GitHub-related queries including repository information, issues, pull requests, and more.

Available GitHub capabilities:
- Repository information and statistics
- Issue management and tracking
- Pull request analysis
- Code search and file operations
- Branch and commit information

";

/// Instruction preamble, optional caller context, then the prompt verbatim.
///
/// The `Additional context:` line is an extension over the plain
/// preamble + `User prompt:` layout and only appears for non-blank context.
pub fn build_augmented_prompt(prompt: &str, context: Option<&str>) -> String {
    let mut augmented = String::from(PREAMBLE);
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        augmented.push_str("Additional context: ");
        augmented.push_str(context);
        augmented.push_str("\n\n");
    }
    augmented.push_str("User prompt: ");
    augmented.push_str(prompt);
    augmented
}

pub struct PromptOrchestrator {
    llm: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolGateway>,
    classifier: IntentClassifier,
}

impl PromptOrchestrator {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        tools: Arc<dyn ToolGateway>,
        classifier: IntentClassifier,
    ) -> Self {
        Self {
            llm,
            tools,
            classifier,
        }
    }

    pub async fn process(&self, request: &PromptRequest) -> Result<PromptResponse, OrchestratorError> {
        info!("Processing prompt with AI and MCP integration");

        let augmented = build_augmented_prompt(&request.prompt, request.context.as_deref());
        let completion = self.llm.complete(&augmented).await.map_err(|e| {
            warn!("LLM call failed: {}", e);
            e
        })?;

        let model = if completion.model.is_empty() {
            self.llm.model().to_string()
        } else {
            completion.model
        };

        let wants_tools = self.classifier.requires_tools(&request.prompt);
        if !wants_tools || !request.enable_mcp_tools {
            if wants_tools {
                info!("Prompt matched tool keywords but caller disabled MCP tools");
            }
            return Ok(PromptResponse::success(completion.text, None, false).with_model(model));
        }

        info!("Executing GitHub MCP tools for enhanced response");
        let tool_data = self
            .tools
            .query(&request.prompt, request.github_token.as_deref())
            .await
            .map_err(|e| {
                warn!("Tool gateway failed: {:#}", e);
                OrchestratorError::ToolGateway(e)
            })?;

        let answer = match &tool_data {
            Some(result) if !result.is_empty() => merge_tool_data(&completion.text, result),
            _ => completion.text,
        };

        Ok(PromptResponse::success(answer, tool_data, true).with_model(model))
    }

    pub async fn available_tools(&self) -> Result<Vec<ToolCatalogEntry>> {
        self.tools.list_tools().await
    }
}
