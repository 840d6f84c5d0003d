use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::CompletionBackend;
use crate::error::{ChatError, Result};
use crate::state::ChatMessage;

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaChatMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

/// Client for the chat endpoint of a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `messages` verbatim and returns the assistant's reply text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        if let Some(error) = body.error {
            return Err(ChatError::Upstream(error));
        }
        body.message
            .map(|m| m.content)
            .ok_or_else(|| ChatError::Decode {
                url,
                message: "response has no message".to_string(),
            })
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let models_response: OllamaModelsResponse = response
            .json()
            .await
            .map_err(|e| ChatError::from_reqwest(&url, e))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn complete(&self, transcript: &[ChatMessage]) -> Result<String> {
        self.chat(transcript).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        OllamaClient::list_models(self).await
    }
}
