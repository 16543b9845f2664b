//! End-to-end analysis flow: orchestrator + breaker + cache + fallback,
//! with the provider seam scripted instead of a live AI endpoint.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskmesh::analyzer::{AnalyzerConfig, TodoAnalyzer};
use taskmesh::provider::{ChatProvider, CompletionRequest};
use taskmesh::remote::{RemoteConfig, ResilientClient};
use taskmesh::resilience::CircuitBreakerConfig;
use taskmesh::types::{Task, TaskStatus};
use taskmesh::{CircuitState, Result};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Provider scripted per test: an optional body, or permanent failure.
struct ScriptedProvider {
    body: Option<String>,
    calls: AtomicU64,
}

impl ScriptedProvider {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body.to_string()),
            calls: AtomicU64::new(0),
        })
    }
    fn failing() -> Arc<Self> {
        Arc::new(Self {
            body: None,
            calls: AtomicU64::new(0),
        })
    }
    fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(taskmesh::Error::remote_with_context(
                "scripted outage",
                taskmesh::ErrorContext::new().with_source("scripted_provider"),
            )),
        }
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn analyzer_with(provider: Arc<ScriptedProvider>) -> TodoAnalyzer {
    let remote = ResilientClient::new(
        provider,
        RemoteConfig::new().with_breaker(
            CircuitBreakerConfig::new()
                .with_max_failures(3)
                .with_reset_timeout(Duration::from_secs(30)),
        ),
    );
    TodoAnalyzer::new(AnalyzerConfig::default()).with_remote(Arc::new(remote))
}

fn task_set() -> Vec<Task> {
    vec![
        Task::new("t1", "write quarterly report"),
        Task::new("t2", "review open PRs"),
        Task::new("t3", "archive old tickets").with_status(TaskStatus::Completed),
    ]
}

#[tokio::test]
async fn analysis_invariants_hold_for_ai_results() {
    init_tracing();
    let provider = ScriptedProvider::ok(
        r#"[{"priority": 9, "suggestedOrder": 1, "estimatedImpact": "high", "tags": ["work"]},
            {"priority": 6, "suggestedOrder": 2},
            {"priority": 2, "suggestedOrder": 3, "estimatedImpact": "low"}]"#,
    );
    let analyzer = analyzer_with(provider);
    let tasks = task_set();

    let response = analyzer.analyze_todos(&tasks).await;

    assert_eq!(response.results.len(), tasks.len());
    for result in &response.results {
        assert!((1..=10).contains(&result.priority));
    }
    assert_eq!(response.summary.total, tasks.len());
    assert_eq!(
        response.summary.total,
        response.summary.high_impact + response.summary.medium_impact + response.summary.low_impact
    );
    // Results come back ordered by suggested order.
    let orders: Vec<usize> = response.results.iter().map(|r| r.suggested_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[tokio::test]
async fn unchanged_task_set_is_served_from_cache() {
    init_tracing();
    let provider = ScriptedProvider::ok(r#"[{"priority": 7}, {"priority": 5}, {"priority": 1}]"#);
    let analyzer = analyzer_with(provider.clone());
    let tasks = task_set();

    let first = analyzer.analyze_todos(&tasks).await;
    let second = analyzer.analyze_todos(&tasks).await;

    assert_eq!(provider.calls(), 1, "second call must not hit the provider");
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap(),
        "cached response must be returned unchanged"
    );
}

#[tokio::test]
async fn status_change_invalidates_the_cache_key() {
    init_tracing();
    let provider = ScriptedProvider::ok(r#"[{"priority": 7}, {"priority": 5}, {"priority": 1}]"#);
    let analyzer = analyzer_with(provider.clone());
    let mut tasks = task_set();

    analyzer.analyze_todos(&tasks).await;
    tasks[0].status = TaskStatus::Completed;
    analyzer.analyze_todos(&tasks).await;

    assert_eq!(provider.calls(), 2, "changed task set must recompute");
}

#[tokio::test]
async fn three_failures_open_the_breaker_and_fourth_call_falls_back() {
    init_tracing();
    let provider = ScriptedProvider::failing();
    let analyzer = analyzer_with(provider.clone());
    let tasks = task_set();

    for _ in 0..3 {
        let response = analyzer.analyze_todos(&tasks).await;
        // Even during the outage every call produces a full response.
        assert_eq!(response.results.len(), tasks.len());
    }
    assert_eq!(analyzer.circuit_state(), CircuitState::Open);
    assert!(!analyzer.is_healthy());
    assert_eq!(provider.calls(), 3);

    let response = analyzer.analyze_todos(&tasks).await;
    assert_eq!(response.results.len(), tasks.len());
    assert_eq!(provider.calls(), 3, "open breaker must not attempt the provider");
}

#[tokio::test]
async fn breaker_recovers_after_reset_timeout() {
    init_tracing();
    // Fails twice (opening the breaker), then serves good responses.
    let provider = Arc::new(FlakyProvider::new(2));
    let remote = ResilientClient::new(
        provider.clone(),
        RemoteConfig::new().with_breaker(
            CircuitBreakerConfig::new()
                .with_max_failures(2)
                .with_reset_timeout(Duration::from_millis(40)),
        ),
    );
    let analyzer = TodoAnalyzer::new(AnalyzerConfig::default()).with_remote(Arc::new(remote));
    let tasks = task_set();

    analyzer.analyze_todos(&tasks).await;
    analyzer.analyze_todos(&tasks).await;
    assert_eq!(analyzer.circuit_state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(60)).await;

    let response = analyzer.analyze_todos(&tasks).await;
    assert_eq!(response.results.len(), tasks.len());
    assert_eq!(analyzer.circuit_state(), CircuitState::Closed);
    assert!(analyzer.is_healthy());
}

#[tokio::test]
async fn empty_task_list_yields_empty_response() {
    init_tracing();
    let provider = ScriptedProvider::ok("[]");
    let analyzer = analyzer_with(provider.clone());

    let response = analyzer.analyze_todos(&[]).await;

    assert!(response.results.is_empty());
    assert_eq!(response.summary.total, 0);
    assert_eq!(response.summary.high_impact, 0);
    assert_eq!(response.summary.medium_impact, 0);
    assert_eq!(response.summary.low_impact, 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn disabled_ai_never_touches_the_provider() {
    init_tracing();
    let provider = ScriptedProvider::ok(r#"[{"priority": 9}]"#);
    let remote = ResilientClient::new(provider.clone(), RemoteConfig::default());
    let analyzer = TodoAnalyzer::new(AnalyzerConfig::new().with_ai_enabled(false))
        .with_remote(Arc::new(remote));

    let response = analyzer.analyze_todos(&task_set()).await;
    assert_eq!(response.results.len(), 3);
    assert_eq!(provider.calls(), 0);
}

/// Fails the first `failures` calls, then returns a fixed good body.
struct FlakyProvider {
    failures: u64,
    calls: AtomicU64,
}

impl FlakyProvider {
    fn new(failures: u64) -> Self {
        Self {
            failures,
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ChatProvider for FlakyProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(taskmesh::Error::remote_with_context(
                "flaky outage",
                taskmesh::ErrorContext::new().with_source("flaky_provider"),
            ))
        } else {
            Ok(r#"[{"priority": 8}, {"priority": 5}, {"priority": 2}]"#.to_string())
        }
    }
    fn name(&self) -> &'static str {
        "flaky"
    }
}
