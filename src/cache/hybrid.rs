//! Hybrid TTL + weighted-eviction cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    created_at: Instant,
    access_count: u64,
    last_accessed_at: Instant,
}

impl<V> Entry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    /// Eviction score blending frequency and recency. The single entry
    /// with the lowest score is evicted. The exact weights are part of the
    /// cache's contract.
    fn score(&self, now: Instant) -> f64 {
        let idle = now.saturating_duration_since(self.last_accessed_at);
        self.access_count as f64 * 0.3 + idle.as_secs_f64() * 0.7
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }
}

/// Point-in-time cache observability report.
#[derive(Debug, Clone)]
pub struct CacheStatsReport {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    /// Age of the oldest live entry, if any.
    pub oldest_age: Option<Duration>,
    /// Age of the newest live entry, if any.
    pub newest_age: Option<Duration>,
}

/// In-process key/value cache with lazy TTL expiry, a proactive sweep task
/// and weighted eviction.
///
/// Size never exceeds `max_size`: an insert into a full cache evicts
/// exactly one entry first. An entry past its TTL is treated as absent
/// regardless of structural presence.
pub struct HybridCache<V> {
    cfg: CacheConfig,
    entries: Arc<Mutex<HashMap<String, Entry<V>>>>,
    stats: Arc<AtomicStats>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V: Clone> HybridCache<V> {
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            cfg,
            entries: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(AtomicStats::new()),
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.cfg
    }

    /// Insert a value. If the cache is at capacity and the key is new, the
    /// lowest-scoring entry is evicted first, so size stays within bounds
    /// at all times.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(&key) && entries.len() >= self.cfg.max_size {
            self.evict_one(&mut entries);
        }
        entries.insert(key, Entry::new(value));
    }

    /// Fetch a value. An entry found past its TTL is removed and reported
    /// absent; a live entry has its access bookkeeping updated.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) if entry.is_expired(self.cfg.ttl) => {
                entries.remove(key);
                self.stats.expirations.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                entry.access_count += 1;
                entry.last_accessed_at = Instant::now();
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Presence check without touching access bookkeeping.
    pub fn has(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|e| !e.is_expired(self.cfg.ttl))
            .unwrap_or(false)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Keys of live (non-expired) entries.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|(_, e)| !e.is_expired(self.cfg.ttl))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn stats(&self) -> CacheStatsReport {
        let entries = self.entries.lock().unwrap();
        let oldest_age = entries.values().map(|e| e.created_at.elapsed()).max();
        let newest_age = entries.values().map(|e| e.created_at.elapsed()).min();
        let hits = self.stats.hits.load(Ordering::Relaxed);
        let misses = self.stats.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStatsReport {
            size: entries.len(),
            max_size: self.cfg.max_size,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            expirations: self.stats.expirations.load(Ordering::Relaxed),
            oldest_age,
            newest_age,
        }
    }

    /// Proactively delete every expired entry. Same TTL rule as the lazy
    /// path in `get`; also available to callers that want a manual sweep.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(self.cfg.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            self.stats
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    fn evict_one(&self, entries: &mut HashMap<String, Entry<V>>) {
        let now = Instant::now();
        let victim = entries
            .iter()
            .map(|(k, e)| (k, e.score(now)))
            // Strict comparison keeps the first-seen entry on ties.
            .fold(None::<(String, f64)>, |best, (k, score)| match best {
                Some((_, best_score)) if score >= best_score => best,
                _ => Some((k.clone(), score)),
            })
            .map(|(k, _)| k);
        if let Some(k) = victim {
            entries.remove(&k);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<V: Clone + Send + 'static> HybridCache<V> {
    /// Start the background sweep task. Must be called from within a tokio
    /// runtime. Calling it again replaces the previous task.
    pub fn start_sweeper(&self) {
        let entries = Arc::clone(&self.entries);
        let stats = Arc::clone(&self.stats);
        let ttl = self.cfg.ttl;
        let period = self.cfg.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so a fresh cache is
            // not swept at startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = {
                    let mut entries = entries.lock().unwrap();
                    let before = entries.len();
                    entries.retain(|_, e| !e.is_expired(ttl));
                    before - entries.len()
                };
                if removed > 0 {
                    stats.expirations.fetch_add(removed as u64, Ordering::Relaxed);
                    debug!(removed, "cache sweep removed expired entries");
                }
            }
        });
        let mut sweeper = self.sweeper.lock().unwrap();
        if let Some(old) = sweeper.replace(handle) {
            old.abort();
        }
    }
}

impl<V> HybridCache<V> {
    /// Stop the sweep task and drop all entries. Safe to call more than
    /// once; the cache stays usable but empty afterwards.
    pub fn shutdown(&self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl<V> Drop for HybridCache<V> {
    fn drop(&mut self) {
        // Backstop so a dropped cache never leaves the sweep task running.
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}
