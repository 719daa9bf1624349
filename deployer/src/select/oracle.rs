//! Decision oracle backends

use std::time::Duration;

use api_models::models::completions::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use crate::errors::DeployerError;
use crate::http::client::{HttpClient, HttpOptions};
use crate::models::selection::{Model, SelectionRequest};
use crate::select::policy::DecisionPrompt;

/// Something that can answer a deployment request.
///
/// Implementations return the raw reply content. The reply is untrusted:
/// parsing and validation happen in the caller for every backend.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(
        &self,
        model: &Model,
        prompt: &DecisionPrompt,
        request: &SelectionRequest,
    ) -> Result<String, DeployerError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Remote reasoning service speaking the chat-completions protocol
#[derive(Debug)]
pub struct ChatCompletionsOracle {
    http: HttpClient,
}

impl ChatCompletionsOracle {
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self, DeployerError> {
        let http = HttpClient::new(
            base_url,
            api_key,
            HttpOptions {
                timeout,
                ..Default::default()
            },
        )?;
        Ok(Self { http })
    }

    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    fn payload(model: &Model, prompt: &DecisionPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.as_str().to_string(),
            messages: vec![
                ChatMessage::system(prompt.system),
                ChatMessage::user(prompt.user.clone()),
            ],
            response_format: ResponseFormat::json_object(),
        }
    }
}

#[async_trait]
impl DecisionOracle for ChatCompletionsOracle {
    async fn decide(
        &self,
        model: &Model,
        prompt: &DecisionPrompt,
        _request: &SelectionRequest,
    ) -> Result<String, DeployerError> {
        let payload = Self::payload(model, prompt);
        let response = self.http.create_chat_completion(&payload).await?;

        if let Some(usage) = response.usage {
            debug!(
                "Oracle used {} prompt + {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DeployerError::InvalidOutcome("no choices in oracle reply".to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| DeployerError::InvalidOutcome("oracle reply has no content".to_string()))
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
