use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::traits::Model;
use super::types::{GenerationRequest, ModelResponse, TokenUsage};
use crate::app::ModelSettings;
use crate::constants::GENERATION_TIMEOUT_SECS;
use crate::utils::AssistantError;

/// Generation backend speaking the OpenAI-compatible chat completions
/// protocol. Works against OpenAI itself or any proxy that translates
/// for other providers.
pub struct RemoteModel {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: Option<String>,
}

impl RemoteModel {
    /// Create a new remote model from settings
    pub fn new(settings: &ModelSettings) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()
            .map_err(|e| AssistantError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        // Key is optional: local proxies accept unauthenticated requests
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model_name: settings.name.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Model for RemoteModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, AssistantError> {
        // Build OpenAI-compatible messages array
        let mut json_messages = Vec::new();

        if let Some(system) = &request.system {
            json_messages.push(json!({
                "role": "system",
                "content": system
            }));
        }

        json_messages.push(json!({
            "role": "user",
            "content": request.prompt
        }));

        let request_body = json!({
            "model": self.model_name,
            "messages": json_messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut http_request = self.client.post(&url).json(&request_body);
        if let Some(key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", key));
        }

        let response = http_request.send().await.map_err(|e| {
            AssistantError::Generation(format!(
                "Failed to reach generation endpoint at {}: {}",
                self.base_url, e
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Generation(format!(
                "Generation endpoint returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Generation(format!("Malformed completion response: {}", e)))?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        // A silent empty reply must surface as an error, not an empty answer
        if content.is_empty() {
            return Err(AssistantError::Generation(
                "Model returned an empty completion".to_string(),
            ));
        }

        Ok(ModelResponse {
            content,
            usage: completion.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model_name: self.model_name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    async fn validate_connection(&self) -> Result<bool, AssistantError> {
        let url = format!("{}/v1/models", self.base_url);
        let mut http_request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", key));
        }
        match http_request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// Response structures for the chat completions API

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}
