//! In-memory stand-ins for the language model and the Tool Server.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::catalog::fallback_catalog;
use crate::error::LlmError;
use crate::llm::{ChatModel, Completion};
use crate::model::{ToolCatalogEntry, ToolResult};
use crate::tool_gateway::ToolGateway;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Answers every prompt the same way and remembers what it was asked.
pub struct ScriptedChatModel {
    reply: std::result::Result<String, String>,
    model: String,
    reported_model: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChatModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            model: "mock-gpt".to_string(),
            reported_model: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            model: "mock-gpt".to_string(),
            reported_model: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Model name carried by completions, when it differs from [`ChatModel::model`].
    pub fn with_reported_model(mut self, model: impl Into<String>) -> Self {
        self.reported_model = Some(model.into());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        lock(&self.prompts).push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                model: self.reported_model.clone().unwrap_or_else(|| self.model.clone()),
            }),
            Err(message) => Err(LlmError::Other(message.clone())),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// What a [`RecordingToolGateway`] answers to queries.
#[derive(Debug, Clone)]
pub enum ToolReply {
    Result(ToolResult),
    Nothing,
    Error(String),
}

/// Tool gateway that records each query and replays a fixed answer.
pub struct RecordingToolGateway {
    reply: ToolReply,
    catalog: std::result::Result<Vec<ToolCatalogEntry>, String>,
    queries: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingToolGateway {
    pub fn new(reply: ToolReply) -> Self {
        Self {
            reply,
            catalog: Ok(fallback_catalog()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<ToolCatalogEntry>) -> Self {
        self.catalog = Ok(catalog);
        self
    }

    pub fn with_catalog_error(mut self, message: impl Into<String>) -> Self {
        self.catalog = Err(message.into());
        self
    }

    /// `(query text, credential)` for every call so far.
    pub fn queries(&self) -> Vec<(String, Option<String>)> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl ToolGateway for RecordingToolGateway {
    async fn query(&self, text: &str, credential: Option<&str>) -> Result<Option<ToolResult>> {
        lock(&self.queries).push((text.to_string(), credential.map(str::to_string)));
        match &self.reply {
            ToolReply::Result(result) => Ok(Some(result.clone())),
            ToolReply::Nothing => Ok(None),
            ToolReply::Error(message) => Err(anyhow!("{}", message)),
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolCatalogEntry>> {
        self.catalog.clone().map_err(|message| anyhow!("{}", message))
    }
}
