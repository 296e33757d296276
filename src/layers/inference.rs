use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::config::ReviewConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

/// A text-generation service. Implementations fail open: any error is logged
/// and reported as an empty completion.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: &InferenceRequest) -> String;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any endpoint speaking the OpenAI chat completions format.
pub struct OpenAiCompatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ReviewConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.inference_base_url.trim_end_matches('/')),
            api_key: config.inference_api_key.clone(),
            model: config.model.clone(),
        })
    }

    async fn try_complete(&self, request: &InferenceRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
            temperature: request.temperature,
        };

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        tracing::debug!("Requesting completion from {} ({} prompt chars)", self.endpoint, request.user_prompt.len());
        let resp = http.send().await.map_err(|e| anyhow!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(400).collect();
            return Err(anyhow!("Inference API error {}: {}", status, snippet));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Inference response carried no message content"))
    }
}

#[async_trait]
impl InferenceClient for OpenAiCompatClient {
    async fn complete(&self, request: &InferenceRequest) -> String {
        match self.try_complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Inference call failed: {}", e);
                String::new()
            }
        }
    }
}
