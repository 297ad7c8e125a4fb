//! Process-wide chunk-handle cache.
//!
//! One cache instance is shared by every domain reader. It is
//! byte-accounted with LRU eviction, remembers missing objects so
//! absent chunks are not refetched per request, and collapses
//! concurrent fetches of the same key to a single upstream open.
//! Entries are `Arc` handles: eviction only drops the cache's
//! reference, never a handle a live read is holding.

use lru::LruCache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use pointcast_common::{PointcastError, Result};

use crate::format::ChunkFile;
use crate::store::ArchiveStore;

/// Approximate cost of a negative entry.
const MISSING_ENTRY_BYTES: usize = 64;

#[derive(Clone)]
enum CacheEntry {
    Found(Arc<ChunkFile>),
    Missing,
}

impl CacheEntry {
    fn byte_size(&self) -> usize {
        match self {
            CacheEntry::Found(file) => file.byte_size(),
            CacheEntry::Missing => MISSING_ENTRY_BYTES,
        }
    }
}

/// Statistics about the chunk cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Cache hit rate in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: LruCache<String, CacheEntry>,
    current_bytes: usize,
}

/// Shared chunk cache with single-flight fetching.
pub struct ChunkCache {
    inner: Mutex<CacheInner>,
    /// Per-key gate serialising upstream opens. The leader fetches
    /// while holding the gate; waiters acquire it afterwards and find
    /// the cache populated.
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    memory_limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ChunkCache {
    /// Create a cache with the given memory budget in bytes.
    pub fn new(memory_limit: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                current_bytes: 0,
            }),
            inflight: Mutex::new(HashMap::new()),
            memory_limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lookup(&self, path: &str) -> Option<CacheEntry> {
        let mut inner = self.inner.lock().expect("cache poisoned");
        inner.entries.get(path).cloned()
    }

    fn insert(&self, path: &str, entry: CacheEntry) {
        let entry_bytes = entry.byte_size();
        let mut inner = self.inner.lock().expect("cache poisoned");

        while inner.current_bytes + entry_bytes > self.memory_limit && !inner.entries.is_empty() {
            if let Some((evicted_path, evicted)) = inner.entries.pop_lru() {
                inner.current_bytes = inner.current_bytes.saturating_sub(evicted.byte_size());
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(path = %evicted_path, "evicted chunk handle");
            }
        }

        if entry_bytes <= self.memory_limit {
            if let Some(old) = inner.entries.push(path.to_string(), entry) {
                inner.current_bytes = inner.current_bytes.saturating_sub(old.1.byte_size());
            }
            inner.current_bytes += entry_bytes;
        }
    }

    /// Whether a key is resident, without touching LRU order.
    pub fn contains(&self, path: &str) -> bool {
        self.inner
            .lock()
            .expect("cache poisoned")
            .entries
            .contains(path)
    }

    /// Fetch a chunk file through the cache.
    ///
    /// Returns `Ok(None)` for an object that does not exist upstream
    /// (also remembered in the cache). Concurrent calls for one key
    /// share a single upstream open. A caller cancelled mid-fetch
    /// leaves the cache untouched; one of the waiters takes over.
    pub async fn get_or_fetch(
        &self,
        path: &str,
        store: &dyn ArchiveStore,
        deadline: Duration,
    ) -> Result<Option<Arc<ChunkFile>>> {
        if let Some(entry) = self.lookup(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(match entry {
                CacheEntry::Found(file) => Some(file),
                CacheEntry::Missing => None,
            });
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let gate = {
            let mut inflight = self.inflight.lock().expect("inflight poisoned");
            inflight
                .entry(path.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let _leader = gate.lock().await;

        // Another task may have completed the fetch while this one
        // waited on the gate.
        if let Some(entry) = self.lookup(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(match entry {
                CacheEntry::Found(file) => Some(file),
                CacheEntry::Missing => None,
            });
        }

        let fetched = match tokio::time::timeout(deadline, store.fetch(path)).await {
            Err(_) => {
                self.release_gate(path);
                return Err(PointcastError::Timeout {
                    path: path.to_string(),
                    deadline_secs: deadline.as_secs(),
                });
            }
            Ok(Err(e)) => {
                self.release_gate(path);
                return Err(e);
            }
            Ok(Ok(bytes)) => bytes,
        };

        let result = match fetched {
            None => {
                self.insert(path, CacheEntry::Missing);
                Ok(None)
            }
            Some(bytes) => match ChunkFile::parse(bytes, path) {
                Ok(file) => {
                    let file = Arc::new(file);
                    self.insert(path, CacheEntry::Found(file.clone()));
                    Ok(Some(file))
                }
                Err(e) => {
                    warn!(path, error = %e, "chunk decode failed");
                    Err(e)
                }
            },
        };
        self.release_gate(path);
        result
    }

    fn release_gate(&self, path: &str) {
        self.inflight
            .lock()
            .expect("inflight poisoned")
            .remove(path);
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache poisoned");
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.entries.len(),
            memory_bytes: inner.current_bytes as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry. In-flight fetches finish undisturbed.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache poisoned");
        inner.entries.clear();
        inner.current_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ChunkFileBuilder;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::AtomicUsize;

    struct CountingStore {
        fetches: AtomicUsize,
        payload: Option<Vec<u8>>,
    }

    impl CountingStore {
        fn with_chunk() -> Self {
            let mut builder = ChunkFileBuilder::new(1, 1, 4, 10.0);
            builder.push_row(&[1.0, 2.0, 3.0, 4.0]).unwrap();
            Self {
                fetches: AtomicUsize::new(0),
                payload: Some(builder.finish().unwrap()),
            }
        }

        fn empty() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                payload: None,
            }
        }
    }

    #[async_trait]
    impl ArchiveStore for CountingStore {
        async fn fetch(&self, _path: &str) -> Result<Option<Bytes>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent callers pile up on the gate.
            tokio::task::yield_now().await;
            Ok(self.payload.clone().map(Bytes::from))
        }
    }

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let cache = ChunkCache::new(1 << 20);
        let store = CountingStore::with_chunk();

        let a = cache
            .get_or_fetch("d/t/chunk_0.dat", &store, Duration::from_secs(5))
            .await
            .unwrap();
        let b = cache
            .get_or_fetch("d/t/chunk_0.dat", &store, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(a.is_some() && b.is_some());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_negative_cached() {
        let cache = ChunkCache::new(1 << 20);
        let store = CountingStore::empty();

        for _ in 0..3 {
            let got = cache
                .get_or_fetch("d/t/chunk_9.dat", &store, Duration::from_secs(5))
                .await
                .unwrap();
            assert!(got.is_none());
        }
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_collapse() {
        let cache = Arc::new(ChunkCache::new(1 << 20));
        let store = Arc::new(CountingStore::with_chunk());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("d/t/chunk_1.dat", store.as_ref(), Duration::from_secs(5))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eviction_keeps_live_handles_valid() {
        // Budget fits roughly one chunk.
        let cache = ChunkCache::new(300);
        let store = CountingStore::with_chunk();

        let held = cache
            .get_or_fetch("d/t/chunk_0.dat", &store, Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();

        for i in 1..8 {
            let path = format!("d/t/chunk_{i}.dat");
            cache
                .get_or_fetch(&path, &store, Duration::from_secs(5))
                .await
                .unwrap();
        }
        assert!(cache.stats().evictions > 0);
        // The held handle still decodes after its cache slot is gone.
        assert_eq!(held.read_row(0, 0).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_memory_accounting_bounded() {
        let cache = ChunkCache::new(500);
        let store = CountingStore::with_chunk();
        for i in 0..32 {
            let path = format!("d/t/chunk_{i}.dat");
            cache
                .get_or_fetch(&path, &store, Duration::from_secs(5))
                .await
                .unwrap();
        }
        assert!(cache.stats().memory_bytes <= 500);
    }
}
