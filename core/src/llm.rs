use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::LlmSettings;
use crate::error::LlmError;

/// Text produced by the language model for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
}

/// Anything that can turn a prompt into a single text answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Model identifier requests are sent with. Used when a completion does
    /// not name the model that produced it.
    fn model(&self) -> &str;
}

/// OpenAI-compatible chat completion client.
pub struct Brain {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl Brain {
    pub fn new(settings: &LlmSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(settings.api_key.clone());
        if let Some(base) = &settings.base_url {
            config = config.with_api_base(base.clone());
        }
        // One attempt per prompt; the caller sees the provider's own error
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = Client::with_config(config).with_backoff(no_retry);

        info!("Brain connected. Model: {}", settings.model);
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout,
        }
    }

    /// Connectivity check used at startup.
    pub async fn say_hello(&self) -> Result<String, LlmError> {
        let completion = self.complete("Hello! Reply with 'System Online'.").await?;
        Ok(completion.text)
    }

    #[allow(deprecated)]
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?,
            )])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl ChatModel for Brain {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request = self.build_request(prompt)?;
        debug!("Sending {} prompt chars to {}", prompt.len(), self.model);

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| LlmError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyCompletion)?;

        Ok(Completion {
            text,
            model: response.model,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
