// External dependencies
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// Internal dependencies
use crate::ai::analyzer::AnalysisError;
use crate::config::Settings;

/// Anything that can turn a prompt into a single text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}

// ============================================================================
// Chat Completion API Structures
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatClient {
    client: Client,
    base_url: Url,
    model_name: String,
    api_key: Option<String>,
    api_key_env: String,
    temperature: f32,
    max_tokens: u32,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl ChatClient {
    /// Creates a client from the `[model]` section of the settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let model = &settings.model;

        let client = Client::builder()
            .timeout(Duration::from_secs(model.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        // A trailing slash keeps `join` from replacing the last path segment.
        let mut base = model.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .with_context(|| format!("Invalid model base URL: {}", model.base_url))?;

        let api_key = std::env::var(&model.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            base_url,
            model_name: model.model.clone(),
            api_key,
            api_key_env: model.api_key_env.clone(),
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key found. Set the {} environment variable.",
                self.api_key_env
            )
        })
    }

    /// Verifies that the endpoint is reachable and accepts the API key
    pub async fn verify_connection(&self) -> Result<()> {
        debug!("Verifying model endpoint connection");

        let url = self
            .base_url
            .join("models")
            .context("Failed to build models URL")?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.api_key()?)
            .send()
            .await
            .context("Failed to connect to model endpoint")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Model endpoint returned error: {}",
                response.status()
            ));
        }

        info!("Model endpoint connection verified");
        Ok(())
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("chat/completions")
            .context("Failed to build chat completions URL")?;

        let request = ChatCompletionRequest {
            model: &self.model_name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            "Sending request to {}, prompt length: {}",
            self.model_name,
            prompt.len()
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key()?)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat completion request failed: {status} {body}"));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Chat completion response contained no choices"))?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!("Completion was cut off at {} tokens", self.max_tokens);
        }

        let content = choice.message.content.unwrap_or_default();
        debug!("Generated response length: {}", content.len());
        Ok(content)
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        self.generate_text(prompt)
            .await
            .map_err(|e| AnalysisError::Provider(format!("{e:#}")))
    }
}
