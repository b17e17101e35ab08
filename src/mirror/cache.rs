// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! LRU cache for mirror verification results.
//!
//! Transparency views re-verify every donation of a project; caching the
//! per-transaction results keeps those reads from hammering the mirror node.
//! Entries expire on a TTL because an initially missing transaction usually
//! becomes visible once the indexer catches up.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::verify::VerificationResult;

struct CacheEntry {
    result: VerificationResult,
    inserted_at: Instant,
}

/// In-process LRU cache of verification results keyed by canonical
/// transaction identifier.
pub struct VerificationCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl VerificationCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Get a cached result. Returns `None` if absent or expired.
    pub fn get(&self, transaction_id: &str) -> Option<VerificationResult> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(transaction_id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.result.clone());
            }
            cache.pop(transaction_id);
        }
        None
    }

    /// Store a result.
    pub fn put(&self, transaction_id: &str, result: VerificationResult) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                transaction_id.to_string(),
                CacheEntry {
                    result,
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(id: &str) -> VerificationResult {
        VerificationResult {
            valid: true,
            amount: "5".to_string(),
            from_account: Some("0.0.4886".to_string()),
            to_account: Some("0.0.5011".to_string()),
            consensus_timestamp: Some("1693219290.006283002".to_string()),
            transaction_id: id.to_string(),
            detail: None,
        }
    }

    #[test]
    fn cache_put_and_get() {
        let cache = VerificationCache::new(10, Duration::from_secs(300));
        let id = "0.0.4886-1693219282.762992295";

        assert!(cache.get(id).is_none());

        cache.put(id, sample_result(id));

        let hit = cache.get(id).unwrap();
        assert!(hit.valid);
        assert_eq!(hit.transaction_id, id);
    }

    #[test]
    fn cache_ttl_expiry() {
        let cache = VerificationCache::new(10, Duration::from_millis(1));
        let id = "0.0.4886-1693219282.762992295";
        cache.put(id, sample_result(id));

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get(id).is_none());
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let cache = VerificationCache::new(1, Duration::from_secs(300));
        cache.put("a", sample_result("a"));
        cache.put("b", sample_result("b"));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }
}
