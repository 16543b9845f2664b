//! 混合缓存模块：TTL 过期加权重淘汰，用于记忆昂贵的 AI 分析结果。
//!
//! # Hybrid Cache Module
//!
//! General-purpose in-process key/value store used to memoize expensive AI
//! analysis results and todo-list query results.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`HybridCache`] | TTL + weighted-eviction cache with a background sweep task |
//! | [`CacheConfig`] | Capacity, TTL and sweep-interval configuration |
//! | [`CacheStatsReport`] | Size, hit rate and entry-age observability |
//! | [`CacheKey`] | Digest-based cache key |
//! | [`CacheKeyGenerator`] | Key derivation from a task set |
//!
//! ## Eviction
//!
//! Eviction blends frequency and recency rather than using textbook LRU:
//! every entry is scored as `access_count * 0.3 + idle_seconds * 0.7` and
//! the single lowest-scoring entry is removed before an insert into a full
//! cache. The formula is part of the cache's contract; see
//! [`HybridCache::set`].
//!
//! ## Expiry
//!
//! Two expiry paths apply the same TTL rule: `get` lazily drops an entry
//! found past its TTL, and a periodic sweep task proactively deletes
//! expired entries so they do not sit in memory until touched.
//!
//! ## Example
//!
//! ```rust
//! use taskmesh::cache::{CacheConfig, HybridCache};
//! use std::time::Duration;
//!
//! let cache: HybridCache<String> = HybridCache::new(
//!     CacheConfig::new()
//!         .with_max_size(100)
//!         .with_ttl(Duration::from_secs(300)),
//! );
//! cache.set("k", "v".to_string());
//! assert_eq!(cache.get("k"), Some("v".to_string()));
//! ```

mod hybrid;
mod key;

pub use hybrid::{CacheConfig, CacheStatsReport, HybridCache};
pub use key::{CacheKey, CacheKeyGenerator};
