//! Chat-completions API client

use api_models::models::completions::{ChatCompletionRequest, ChatCompletionResponse};

use crate::errors::DeployerError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Submit a chat-completions request
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, DeployerError> {
        self.post("/chat/completions", request).await
    }
}
