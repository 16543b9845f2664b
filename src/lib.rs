//! # taskmesh
//!
//! 多节点任务清单服务的弹性分析核心：熔断器、混合缓存与节点同步通道。
//!
//! Resilient analysis core for a multi-node task-list service. Each server
//! process embeds this crate to (a) tolerate a flaky external AI dependency
//! without cascading failure, (b) avoid redundant AI calls through caching,
//! and (c) keep independently running nodes eventually consistent about
//! task mutations over a publish/subscribe channel.
//!
//! ## Overview
//!
//! The storage layer calls one entry point, [`TodoAnalyzer::analyze_todos`],
//! on read paths. The orchestrator consults the [`cache`] first, then the
//! circuit-breaker-guarded [`remote`] client, and degrades to a
//! deterministic local heuristic on any failure — analysis quality drops
//! during an AI outage, task CRUD never blocks. Mutation paths invalidate
//! the local cache and publish a [`sync::SyncEvent`] so the other nodes
//! invalidate theirs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskmesh::analyzer::{AnalyzerConfig, TodoAnalyzer};
//! use taskmesh::provider::HttpChatProvider;
//! use taskmesh::remote::{RemoteConfig, ResilientClient};
//! use taskmesh::types::Task;
//!
//! #[tokio::main]
//! async fn main() -> taskmesh::Result<()> {
//!     let provider = Arc::new(HttpChatProvider::new("https://api.openai.com/v1")?);
//!     let remote = Arc::new(ResilientClient::new(provider, RemoteConfig::default()));
//!     let analyzer = TodoAnalyzer::new(AnalyzerConfig::default()).with_remote(remote);
//!     analyzer.start();
//!
//!     let tasks = vec![Task::new("1", "ship the release")];
//!     let response = analyzer.analyze_todos(&tasks).await;
//!     println!("top pick: {:?}", response.results.first());
//!
//!     analyzer.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`analyzer`] | Analysis orchestrator and deterministic fallback heuristic |
//! | [`remote`] | Circuit-breaker-guarded remote AI client |
//! | [`resilience`] | Circuit breaker state machine |
//! | [`cache`] | Hybrid TTL + weighted-eviction cache |
//! | [`sync`] | Cross-node mutation notification channel |
//! | [`provider`] | Chat-completion provider seam and HTTP implementation |
//! | [`types`] | Task and analysis result types |
//!
//! ## Consistency model
//!
//! Within one node: mutation, then cache invalidation, then event publish,
//! in that order, so a local read after a local write never sees stale
//! analysis. Across nodes: eventual only, bounded by channel delivery
//! latency; receivers ignore their own echoes.

pub mod analyzer;
pub mod cache;
pub mod provider;
pub mod remote;
pub mod resilience;
pub mod sync;
pub mod types;

// Re-export main types for convenience
pub use analyzer::{AnalyzerConfig, TodoAnalyzer};
pub use cache::{CacheConfig, HybridCache};
pub use remote::{RemoteConfig, ResilientClient};
pub use resilience::{CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use sync::{NodeSyncChannel, SyncConfig, SyncEvent, SyncEventKind};
pub use types::{AnalysisResponse, AnalysisResult, ImpactLevel, Task, TaskStatus};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
