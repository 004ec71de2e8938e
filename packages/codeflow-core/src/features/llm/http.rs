//! OpenAI-compatible chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::{FlowError, Result};

use super::{ModelClient, ModelError};

/// Model-service connection settings
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ModelConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    /// Load from environment: GROQ_API_KEY first, then OPENAI_API_KEY
    pub fn from_env() -> Result<Self> {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            return Ok(Self::new(
                "https://api.groq.com/openai/v1",
                key,
                std::env::var("CODEFLOW_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            ));
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            return Ok(Self::new(
                std::env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                key,
                std::env::var("CODEFLOW_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ));
        }
        Err(FlowError::config(
            "no model provider configured; set GROQ_API_KEY or OPENAI_API_KEY",
        ))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for an OpenAI-style /chat/completions endpoint
pub struct HttpModelClient {
    client: Client,
    config: ModelConfig,
}

impl HttpModelClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(ModelError::RateLimited { retry_after_ms });
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!("status {}", status.as_u16())));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(ModelError::Service {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(ModelError::InvalidRequest(format!(
                "status {}: {}",
                status.as_u16(),
                message
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ModelError::InvalidResponse("missing choices[0].message.content".into()))
    }
}
