//! Content-addressed generation cache.
//!
//! Maps a request's content key to its successful result so semantically
//! identical requests never pay for a second provider call. Entries
//! expire after a TTL; expired entries are misses and are removed on
//! access. There is no background eviction task — `put` sweeps expired
//! entries whenever the map crosses a size watermark.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use cardforge_core::GenerationResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: GenerationResult,
    stored_at: Instant,
}

/// In-memory dedup cache keyed by content key.
pub struct GenerationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl GenerationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Look up a non-expired result. An expired entry counts as a miss
    /// and is removed.
    pub async fn get(&self, content_key: &str) -> Option<GenerationResult> {
        {
            let entries = self.entries.read().await;
            match entries.get(content_key) {
                Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                    return Some(entry.result.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but has expired; drop it under the write lock.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(content_key) {
            if entry.stored_at.elapsed() <= self.ttl {
                // Re-inserted between the locks.
                return Some(entry.result.clone());
            }
            entries.remove(content_key);
        }
        None
    }

    /// Store a successful result. Failed results are rejected so a
    /// transient provider error can never mask a later success.
    ///
    /// Returns whether the result was stored. Last write wins for
    /// concurrent puts of the same key.
    pub async fn put(&self, content_key: &str, result: GenerationResult) -> bool {
        if !result.success {
            tracing::debug!(content_key, "refusing to cache failed result");
            return false;
        }
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            let before = entries.len();
            entries.retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
            tracing::debug!(
                evicted = before - entries.len(),
                remaining = entries.len(),
                "cache sweep at size watermark",
            );
        }
        entries.insert(
            content_key.to_string(),
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
        true
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{FailureKind, ProviderKind};

    fn ok_result() -> GenerationResult {
        GenerationResult::ok(vec![0xAB; 64], ProviderKind::Gemini, 0.005)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = GenerationCache::new(Duration::from_secs(3600), 256);
        assert!(cache.put("key-a", ok_result()).await);

        let hit = cache.get("key-a").await.expect("should hit");
        assert!(hit.success);
        assert_eq!(hit.image_bytes, vec![0xAB; 64]);
        assert!(cache.get("key-b").await.is_none());
    }

    #[tokio::test]
    async fn failed_results_are_never_stored() {
        let cache = GenerationCache::new(Duration::from_secs(3600), 256);
        let failed = GenerationResult::failed(FailureKind::ValidationFailed, "too small");
        assert!(!cache.put("key-a", failed).await);
        assert!(cache.get("key-a").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_a_miss_and_is_removed() {
        let cache = GenerationCache::new(Duration::from_secs(60), 256);
        cache.put("key-a", ok_result()).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("key-a").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_within_ttl_still_hits() {
        let cache = GenerationCache::new(Duration::from_secs(60), 256);
        cache.put("key-a", ok_result()).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("key-a").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn watermark_sweep_evicts_only_expired_entries() {
        let cache = GenerationCache::new(Duration::from_secs(60), 2);
        cache.put("old-1", ok_result()).await;
        cache.put("old-2", ok_result()).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        // Map is at the watermark; this insert sweeps the expired pair.
        cache.put("fresh", ok_result()).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn last_write_wins_for_same_key() {
        let cache = GenerationCache::new(Duration::from_secs(3600), 256);
        cache.put("key-a", ok_result()).await;
        let newer = GenerationResult::ok(vec![0xCD; 32], ProviderKind::OpenAi, 0.19);
        cache.put("key-a", newer).await;

        let hit = cache.get("key-a").await.expect("should hit");
        assert_eq!(hit.provider_used, Some(ProviderKind::OpenAi));
        assert_eq!(hit.image_bytes, vec![0xCD; 32]);
    }
}
