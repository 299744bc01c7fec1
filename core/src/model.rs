use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::Operation;

pub const MAX_PROMPT_CHARS: usize = 2000;

fn default_true() -> bool {
    true
}

// Input: what the caller sends us
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default = "default_true")]
    pub enable_mcp_tools: bool,
    #[serde(default, skip_serializing)]
    pub github_token: Option<String>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            enable_mcp_tools: true,
            github_token: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_tools(mut self, enabled: bool) -> Self {
        self.enable_mcp_tools = enabled;
        self
    }

    pub fn with_github_token(mut self, token: impl Into<String>) -> Self {
        self.github_token = Some(token.into());
        self
    }

    /// Returns every rule the request breaks. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.prompt.trim().is_empty() {
            problems.push("Prompt cannot be empty".to_string());
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            problems.push(format!(
                "Prompt cannot exceed {} characters",
                MAX_PROMPT_CHARS
            ));
        }
        problems
    }
}

// Tokens never reach the logs
impl fmt::Debug for PromptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRequest")
            .field("prompt", &self.prompt)
            .field("context", &self.context)
            .field("enable_mcp_tools", &self.enable_mcp_tools)
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

// Output: what we send back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    #[serde(rename = "response")]
    pub answer: String,
    #[serde(rename = "mcpData")]
    pub tool_data: Option<ToolResult>,
    #[serde(rename = "usedMcpTools")]
    pub used_tools: bool,
    pub timestamp: DateTime<Utc>,
    pub status: ResponseStatus,
    pub model: Option<String>,
}

impl PromptResponse {
    pub fn success(answer: String, tool_data: Option<ToolResult>, used_tools: bool) -> Self {
        Self {
            answer,
            tool_data,
            used_tools,
            timestamp: Utc::now(),
            status: ResponseStatus::Success,
            model: None,
        }
    }

    pub fn failure(answer: String) -> Self {
        Self {
            answer,
            tool_data: None,
            used_tools: false,
            timestamp: Utc::now(),
            status: ResponseStatus::Error,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    pub analyze_intent: bool,
    pub max_results: u32,
    pub operation: Operation,
}

/// Body of `POST /mcp/github`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolQuery {
    pub method: String,
    pub query: String,
    pub timestamp: i64,
    pub parameters: QueryParameters,
}

impl ToolQuery {
    pub const MAX_RESULTS: u32 = 10;

    pub fn new(query: impl Into<String>, operation: Operation) -> Self {
        Self {
            method: "query".to_string(),
            query: query.into(),
            timestamp: Utc::now().timestamp_millis(),
            parameters: QueryParameters {
                analyze_intent: true,
                max_results: Self::MAX_RESULTS,
                operation,
            },
        }
    }
}

/// Soft failure reported in place of Tool Server data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub error: bool,
    pub message: String,
    pub status: String,
    pub timestamp: i64,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            status: "failed".to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Rough shape of a Tool Server payload, used for logging and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    RepositoryListing,
    IssueListing,
    StatusOnly,
    Unstructured,
}

/// Whatever JSON object the Tool Server answered with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolPayload(pub Map<String, Value>);

impl ToolPayload {
    pub fn repositories(&self) -> Option<&Value> {
        self.0.get("repositories")
    }

    pub fn issues(&self) -> Option<&Value> {
        self.0.get("issues")
    }

    pub fn status(&self) -> Option<&Value> {
        self.0.get("status")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn shape(&self) -> PayloadShape {
        if self.repositories().is_some() {
            PayloadShape::RepositoryListing
        } else if self.issues().is_some() {
            PayloadShape::IssueListing
        } else if self.status().is_some() && self.0.len() == 1 {
            PayloadShape::StatusOnly
        } else {
            PayloadShape::Unstructured
        }
    }
}

impl From<Map<String, Value>> for ToolPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Outcome of a tool query. Serializes to the bare JSON object either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Failure(ToolFailure),
    Payload(ToolPayload),
}

impl ToolResult {
    pub fn failure(message: impl Into<String>) -> Self {
        ToolResult::Failure(ToolFailure::new(message))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolResult::Failure(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ToolResult::Failure(_) => false,
            ToolResult::Payload(payload) => payload.is_empty(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            ToolResult::Failure(failure) => match key {
                "error" => Some(Value::Bool(failure.error)),
                "message" => Some(Value::String(failure.message.clone())),
                "status" => Some(Value::String(failure.status.clone())),
                "timestamp" => Some(Value::from(failure.timestamp)),
                _ => None,
            },
            ToolResult::Payload(payload) => payload.0.get(key).cloned(),
        }
    }
}

/// One capability advertised by `GET /mcp/tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalogEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    // Anything else the server describes (schemas, annotations) passes through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolCatalogEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            available: true,
            reason: None,
            extra: Map::new(),
        }
    }

    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.available = false;
        self.reason = Some(reason.into());
        self
    }
}
