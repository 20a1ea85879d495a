//! Generative-model collaborator.
//!
//! The router only depends on the [`TextGenerator`] trait; the concrete
//! client speaks the OpenRouter chat-completions API. A failed or empty
//! generation is a hard error for the request it served — never retried,
//! never silently replaced.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::AssistantConfig;
use crate::error::AssistantError;

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

/// External text-generation collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion for the given system/user prompt pair.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AssistantError>;

    /// Provider tag reported on the health endpoint.
    fn provider(&self) -> &str {
        "openrouter"
    }
}

/// OpenRouter chat-completions client.
pub struct OpenRouterCompletion {
    model: String,
    api_key: Option<String>,
    url: String,
    client: reqwest::Client,
}

impl OpenRouterCompletion {
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            model: model.into(),
            api_key,
            url: url.into(),
            client,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            config.openrouter_model.clone(),
            config.openrouter_api_key.clone(),
            config.openrouter_url.clone(),
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenRouterCompletion {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AssistantError::generation("OPENR_API_KEY not set in environment variables")
        })?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            // Attribution headers required by OpenRouter.
            .header("HTTP-Referer", "https://crypgptai.vercel.app")
            .header("X-Title", "CrypGPT Assistant")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::generation(format!("OpenRouter request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error: Value = response.json().await.unwrap_or_default();
            let message = error
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(AssistantError::generation(format!(
                "OpenRouter API error: {}",
                message
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::generation(format!("OpenRouter response: {}", e)))?;

        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AssistantError::generation("no content returned from OpenRouter"))?;

        Ok(content.to_string())
    }
}
