//! AI 服务商接口：一次补全调用的最小抽象。
//!
//! # Chat Provider Module
//!
//! The seam between the analysis core and the remote AI dependency: a
//! single completion-style call taking a prompt plus model parameters and
//! returning free text. The resilience layer wraps implementations of this
//! trait; tests substitute scripted ones.

mod http;

pub use http::HttpChatProvider;

use crate::Result;
use async_trait::async_trait;

/// Parameters for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// One unreliable remote call. Implementations surface transport problems
/// as errors; content interpretation belongs to the caller.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
    fn name(&self) -> &'static str;
}
