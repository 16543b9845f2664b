//! HTTP chat-completions provider.

use super::{ChatProvider, CompletionRequest};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde_json::json;
use std::env;
use std::time::Duration;

/// OpenAI-compatible chat-completions client.
pub struct HttpChatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpChatProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("TASKMESH_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(
                env::var("TASKMESH_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: env::var("TASKMESH_API_KEY").ok(),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::remote_with_context(
                format!("provider returned HTTP {}", status.as_u16()),
                ErrorContext::new()
                    .with_source("http_provider")
                    .with_details(text.chars().take(200).collect::<String>()),
            ));
        }

        let payload: serde_json::Value = resp.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::remote_with_context(
                    "completion response missing message content",
                    ErrorContext::new()
                        .with_source("http_provider")
                        .with_field_path("choices[0].message.content"),
                )
            })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
