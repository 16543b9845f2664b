//! Breaker-gated analysis client.

use super::{parse, prompt};
use crate::provider::{ChatProvider, CompletionRequest};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState};
use crate::types::{AnalysisResult, Task};
use crate::Result;
use std::sync::Arc;
use tracing::warn;

/// Model parameters for the analysis call.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub breaker: CircuitBreakerConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            max_tokens: 1024,
            temperature: 0.3,
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RemoteConfig {
    pub fn new() -> Self {
        Self::default()
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
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }
}

/// Remote AI analysis behind a circuit breaker.
///
/// `analyze` fails with `ServiceUnavailable` while the breaker is open
/// (fail fast, no network attempt) and with `RemoteCallFailed` when the
/// provider errors or returns nothing salvageable. Callers own the
/// fallback; this client only owns the remote risk.
pub struct ResilientClient {
    provider: Arc<dyn ChatProvider>,
    breaker: CircuitBreaker,
    cfg: RemoteConfig,
}

impl ResilientClient {
    pub fn new(provider: Arc<dyn ChatProvider>, cfg: RemoteConfig) -> Self {
        let breaker = CircuitBreaker::new(cfg.breaker.clone());
        Self {
            provider,
            breaker,
            cfg,
        }
    }

    /// Ask the provider to rank `tasks`. Breaker admission first; the
    /// provider outcome is recorded on the permit so the state machine in
    /// [`CircuitBreaker`] sees every attempt. Cancelling this future while
    /// the provider call is pending drops the permit, which releases the
    /// Half-Open probe slot instead of holding it forever.
    pub async fn analyze(&self, tasks: &[Task]) -> Result<Vec<AnalysisResult>> {
        let permit = self.breaker.allow()?;

        let request = CompletionRequest::new(prompt::build_analysis_prompt(tasks))
            .with_model(self.cfg.model.clone())
            .with_max_tokens(self.cfg.max_tokens)
            .with_temperature(self.cfg.temperature);

        let raw = match self.provider.complete(&request).await {
            Ok(raw) => {
                permit.record_success();
                raw
            }
            Err(e) => {
                permit.record_failure();
                warn!(provider = self.provider.name(), error = %e, "provider call failed");
                return Err(e);
            }
        };

        parse::parse_analysis(&raw, tasks.len())
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        self.breaker.snapshot()
    }
}
