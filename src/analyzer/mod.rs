//! 分析编排器：缓存、远端客户端与本地启发式的组合入口。
//!
//! # Analysis Orchestrator Module
//!
//! The single entry point the storage layer calls for task-priority
//! analysis. Per call the orchestrator works down a fixed ladder:
//!
//! 1. AI disabled or no remote client configured → deterministic fallback
//! 2. Cache hit for the current task set → cached response unchanged
//! 3. Remote analysis via the circuit-breaker client → cached and returned
//! 4. Any remote failure (breaker open included) → deterministic fallback
//!
//! `analyze_todos` therefore never fails: an AI outage degrades analysis
//! quality, it never blocks task CRUD.
//!
//! ```rust
//! use taskmesh::analyzer::{AnalyzerConfig, TodoAnalyzer};
//! use taskmesh::types::Task;
//!
//! # tokio_test::block_on(async {
//! let analyzer = TodoAnalyzer::new(AnalyzerConfig::default());
//! let response = analyzer.analyze_todos(&[Task::new("1", "write docs")]).await;
//! assert_eq!(response.results.len(), 1);
//! # });
//! ```

pub mod fallback;

pub use fallback::fallback_analysis;

use crate::cache::{CacheConfig, CacheKeyGenerator, HybridCache};
use crate::remote::ResilientClient;
use crate::resilience::CircuitState;
use crate::sync::{SyncEvent, SyncHandler};
use crate::types::{AnalysisResponse, Task};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Administrative kill switch for AI analysis.
    pub ai_enabled: bool,
    pub cache: CacheConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            cache: CacheConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ai_enabled(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Orchestrates cache, resilient remote client and local heuristic.
pub struct TodoAnalyzer {
    cfg: AnalyzerConfig,
    cache: HybridCache<AnalysisResponse>,
    keygen: CacheKeyGenerator,
    remote: Option<Arc<ResilientClient>>,
}

impl TodoAnalyzer {
    /// Analyzer without a remote client: every call uses the heuristic.
    pub fn new(cfg: AnalyzerConfig) -> Self {
        let cache = HybridCache::new(cfg.cache.clone());
        Self {
            cfg,
            cache,
            keygen: CacheKeyGenerator::new(),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<ResilientClient>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Start the cache's background sweep task. Call once from within the
    /// runtime; pair with [`shutdown`](Self::shutdown).
    pub fn start(&self) {
        self.cache.start_sweeper();
    }

    /// Analyze the given task set. Infallible by contract: remote errors
    /// are absorbed here and answered with the deterministic fallback.
    pub async fn analyze_todos(&self, tasks: &[Task]) -> AnalysisResponse {
        if tasks.is_empty() {
            return AnalysisResponse::empty();
        }

        let remote = match (&self.remote, self.cfg.ai_enabled) {
            (Some(remote), true) => remote,
            _ => return fallback_analysis(tasks, Utc::now()),
        };

        let key = self.keygen.for_tasks(tasks);
        if let Some(hit) = self.cache.get(key.as_str()) {
            debug!(key = %key, "analysis cache hit");
            return hit;
        }

        match remote.analyze(tasks).await {
            // One result per task. A provider that returns more or fewer
            // items than tasks is not trusted or cached.
            Ok(results) if results.len() == tasks.len() => {
                let response = AnalysisResponse::from_results(results);
                self.cache.set(key.as_str(), response.clone());
                response
            }
            Ok(results) => {
                warn!(
                    expected = tasks.len(),
                    got = results.len(),
                    "remote returned wrong result count, using fallback heuristic"
                );
                fallback_analysis(tasks, Utc::now())
            }
            Err(e) => {
                warn!(error = %e, "remote analysis failed, using fallback heuristic");
                fallback_analysis(tasks, Utc::now())
            }
        }
    }

    /// Drop all cached analysis. Called on task mutations, before the sync
    /// event for the mutation is published, so a local read after a local
    /// write never sees stale analysis.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Healthy unless the breaker is currently open.
    pub fn is_healthy(&self) -> bool {
        self.circuit_state() != CircuitState::Open
    }

    /// Breaker state, for operators. Reports Closed when no remote client
    /// is configured.
    pub fn circuit_state(&self) -> CircuitState {
        self.remote
            .as_ref()
            .map(|r| r.circuit_state())
            .unwrap_or(CircuitState::Closed)
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStatsReport {
        self.cache.stats()
    }

    /// Stop the sweep task and clear the cache.
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }
}

/// Remote mutations invalidate local analysis: every task-shaped sync
/// event from another node clears this node's cached responses.
impl SyncHandler for TodoAnalyzer {
    fn on_task_added(&self, event: &SyncEvent) {
        debug!(node = %event.node_id, "task added remotely, invalidating analysis cache");
        self.invalidate();
    }

    fn on_task_updated(&self, event: &SyncEvent) {
        debug!(node = %event.node_id, "task updated remotely, invalidating analysis cache");
        self.invalidate();
    }

    fn on_task_removed(&self, event: &SyncEvent) {
        debug!(node = %event.node_id, "task removed remotely, invalidating analysis cache");
        self.invalidate();
    }

    fn on_list_cleared(&self, event: &SyncEvent) {
        debug!(node = %event.node_id, "task list cleared remotely, invalidating analysis cache");
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatProvider, CompletionRequest};
    use crate::remote::RemoteConfig;
    use crate::resilience::CircuitBreakerConfig;
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct CountingProvider {
        body: Option<String>,
        calls: AtomicU64,
    }

    impl CountingProvider {
        fn ok(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                calls: AtomicU64::new(0),
            }
        }
        fn failing() -> Self {
            Self {
                body: None,
                calls: AtomicU64::new(0),
            }
        }
        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatProvider for CountingProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(body.clone()),
                None => Err(crate::Error::remote_with_context(
                    "simulated outage",
                    crate::ErrorContext::new().with_source("counting_provider"),
                )),
            }
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn tasks(n: usize) -> Vec<Task> {
        (0..n)
            .map(|i| Task::new(i.to_string(), format!("task {}", i)))
            .collect()
    }

    fn analyzer_with(provider: Arc<CountingProvider>, max_failures: u32) -> TodoAnalyzer {
        let remote = ResilientClient::new(
            provider,
            RemoteConfig::new().with_breaker(
                CircuitBreakerConfig::new()
                    .with_max_failures(max_failures)
                    .with_reset_timeout(Duration::from_secs(30)),
            ),
        );
        TodoAnalyzer::new(AnalyzerConfig::default()).with_remote(Arc::new(remote))
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let analyzer = TodoAnalyzer::new(AnalyzerConfig::default());
        let resp = analyzer.analyze_todos(&[]).await;
        assert!(resp.results.is_empty());
        assert_eq!(resp.summary.total, 0);
    }

    #[tokio::test]
    async fn test_disabled_ai_uses_fallback() {
        let provider = Arc::new(CountingProvider::ok(r#"[{"priority": 9}]"#));
        let analyzer = analyzer_with(provider.clone(), 3);
        let analyzer = TodoAnalyzer {
            cfg: AnalyzerConfig::new().with_ai_enabled(false),
            ..analyzer
        };

        let resp = analyzer.analyze_todos(&tasks(2)).await;
        assert_eq!(resp.results.len(), 2);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let provider = Arc::new(CountingProvider::ok(
            r#"[{"priority": 9, "suggestedOrder": 1}, {"priority": 4, "suggestedOrder": 2}]"#,
        ));
        let analyzer = analyzer_with(provider.clone(), 3);
        let task_set = tasks(2);

        let first = analyzer.analyze_todos(&task_set).await;
        let second = analyzer.analyze_todos(&task_set).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalidate_forces_remote_call() {
        let provider = Arc::new(CountingProvider::ok(r#"[{"priority": 9}]"#));
        let analyzer = analyzer_with(provider.clone(), 3);
        let task_set = tasks(1);

        analyzer.analyze_todos(&task_set).await;
        analyzer.invalidate();
        analyzer.analyze_todos(&task_set).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_degrades_to_fallback() {
        let provider = Arc::new(CountingProvider::failing());
        let analyzer = analyzer_with(provider.clone(), 3);
        let task_set = tasks(3);

        let resp = analyzer.analyze_todos(&task_set).await;
        assert_eq!(resp.results.len(), 3);
        assert_eq!(resp.summary.total, 3);
        for r in &resp.results {
            assert!((1..=10).contains(&r.priority));
        }
    }

    #[tokio::test]
    async fn test_wrong_result_count_degrades_to_fallback_uncached() {
        // One item for three tasks: the response is rejected.
        let provider = Arc::new(CountingProvider::ok(r#"[{"priority": 9}]"#));
        let analyzer = analyzer_with(provider.clone(), 3);
        let task_set = tasks(3);

        let resp = analyzer.analyze_todos(&task_set).await;
        assert_eq!(resp.results.len(), 3);
        assert_eq!(resp.summary.total, 3);
        for r in &resp.results {
            assert!((1..=10).contains(&r.priority));
        }

        // The mismatched response was never cached, so the next call goes
        // back to the provider.
        analyzer.analyze_todos(&task_set).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_oversized_result_count_degrades_to_fallback() {
        let body: Vec<String> = (0..5).map(|_| r#"{"priority": 7}"#.to_string()).collect();
        let provider = Arc::new(CountingProvider::ok(&format!("[{}]", body.join(","))));
        let analyzer = analyzer_with(provider.clone(), 3);

        let resp = analyzer.analyze_todos(&tasks(2)).await;
        assert_eq!(resp.results.len(), 2);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_remote_and_falls_back() {
        let provider = Arc::new(CountingProvider::failing());
        let analyzer = analyzer_with(provider.clone(), 3);
        let task_set = tasks(1);

        for _ in 0..3 {
            analyzer.analyze_todos(&task_set).await;
        }
        assert_eq!(analyzer.circuit_state(), CircuitState::Open);
        assert!(!analyzer.is_healthy());

        // Fourth call: fallback results, no provider attempt.
        let resp = analyzer.analyze_todos(&task_set).await;
        assert_eq!(resp.results.len(), 1);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_no_remote_reports_healthy_closed() {
        let analyzer = TodoAnalyzer::new(AnalyzerConfig::default());
        assert!(analyzer.is_healthy());
        assert_eq!(analyzer.circuit_state(), CircuitState::Closed);
    }
}
