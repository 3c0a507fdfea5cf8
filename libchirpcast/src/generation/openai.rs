//! OpenAI-compatible model client
//!
//! Speaks the `/chat/completions` API, which OpenAI, Ollama, vLLM, LM Studio
//! and most hosted gateways expose. The tier of a request selects one of the
//! three configured model names.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{Completion, GenerationRequest, ModelClient, ModelTier};
use crate::config::{GenerationConfig, HttpConfig};
use crate::error::{GenerationError, Result};
use crate::logging::sanitize_for_logging;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    n: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    response_format: Value,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

fn map_http_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Provider(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GenerationError::Provider(format!("Connection error: {}", error))
    } else {
        GenerationError::Provider(format!("HTTP error: {}", error))
    }
}

/// OpenAI-compatible provider client
pub struct OpenAIClient {
    client: Client,
    provider: String,
    base_url: String,
    api_key: Option<SecretString>,
    small_model: String,
    medium_model: String,
    large_model: String,
}

impl OpenAIClient {
    /// Build a client from generation and HTTP settings
    ///
    /// `api_key` may be `None` for local servers that do not check it.
    pub fn new(
        config: &GenerationConfig,
        api_key: Option<SecretString>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .map_err(|e| {
                GenerationError::Provider(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            provider: config.provider.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            small_model: config.small_model.clone(),
            medium_model: config.medium_model.clone(),
            large_model: config.large_model.clone(),
        })
    }

    /// Model name configured for `tier`
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Small => &self.small_model,
            ModelTier::Medium => &self.medium_model,
            ModelTier::Large => &self.large_model,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    async fn complete(&self, request: GenerationRequest) -> Result<Completion> {
        let model = self.model_for(request.tier);
        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(request.prompt),
            }],
            n: 1,
            stop: request.stop,
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "generated_content",
                    "schema": request.schema,
                    "strict": true
                }
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting {} completion from {} ({})", request.tier, url, model);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Provider(format!(
                "Request failed with status {}: {}",
                status,
                sanitize_for_logging(&error_text, 200)
            ))
            .into());
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Provider("No choices in response".to_string()))?;

        Ok(Completion {
            content,
            model: completion.model.unwrap_or_else(|| model.to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}
