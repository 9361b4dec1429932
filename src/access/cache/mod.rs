/*!
 * Decision Cache
 * TTL-bounded cache for authorization decisions
 */

use crate::access::types::core::AccessDecision;
use crate::core::types::UserId;
use ahash::RandomState;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key for decision lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    user: UserId,
    capability_hash: u64,
}

impl CacheKey {
    fn new(user: UserId, capability: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        capability.hash(&mut hasher);
        Self {
            user,
            capability_hash: hasher.finish(),
        }
    }
}

/// Cached decision with its expiry
struct CachedDecision {
    decision: AccessDecision,
    expires_at: SystemTime,
}

/// Decision cache with TTL expiry.
///
/// The TTL bounds how long an expiring membership or grant can keep
/// producing a stale decision; mutations additionally invalidate the
/// affected user's slice. Eviction on overflow drops an arbitrary entry,
/// which is harmless here because a miss only costs a re-evaluation.
pub struct DecisionCache {
    cache: DashMap<CacheKey, CachedDecision, RandomState>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecisionCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            cache: DashMap::with_capacity_and_hasher(max_size, RandomState::new()),
            max_size,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a cached decision, marked as cached
    pub fn get(&self, user: UserId, capability: &str, now: SystemTime) -> Option<AccessDecision> {
        let key = CacheKey::new(user, capability);

        if let Some(entry) = self.cache.get(&key) {
            if entry.expires_at > now {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.decision.clone().with_cached(true));
            }
            drop(entry);
            self.cache.remove(&key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a decision
    pub fn put(&self, user: UserId, capability: &str, decision: AccessDecision, now: SystemTime) {
        if self.cache.len() >= self.max_size {
            if let Some(entry) = self.cache.iter().next() {
                let key = entry.key().clone();
                drop(entry);
                self.cache.remove(&key);
            }
        }

        self.cache.insert(
            CacheKey::new(user, capability),
            CachedDecision {
                decision,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drop every cached decision for a user
    pub fn invalidate_user(&self, user: UserId) {
        self.cache.retain(|key, _| key.user != user);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.cache.len(),
            max_size: self.max_size,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::types::core::AccessRequest;

    const T0: SystemTime = SystemTime::UNIX_EPOCH;

    fn decision(user: UserId, capability: &str) -> AccessDecision {
        let request = AccessRequest::new(user, capability, T0);
        AccessDecision::allow(request, "group", "granted by group 'frontline'")
    }

    #[test]
    fn test_cache_hit() {
        let cache = DecisionCache::new(100, Duration::from_secs(10));
        cache.put(1, "ops.calls.make", decision(1, "ops.calls.make"), T0);

        let cached = cache.get(1, "ops.calls.make", T0 + Duration::from_secs(1));
        assert!(cached.is_some());
        assert!(cached.unwrap().cached);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_miss() {
        let cache = DecisionCache::new(100, Duration::from_secs(10));
        assert!(cache.get(1, "ops.calls.make", T0).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_cache_expiry() {
        let cache = DecisionCache::new(100, Duration::from_secs(5));
        cache.put(1, "ops.calls.make", decision(1, "ops.calls.make"), T0);

        assert!(cache.get(1, "ops.calls.make", T0 + Duration::from_secs(6)).is_none());
    }

    #[test]
    fn test_invalidate_user() {
        let cache = DecisionCache::new(100, Duration::from_secs(10));
        cache.put(1, "ops.calls.make", decision(1, "ops.calls.make"), T0);
        cache.put(2, "ops.calls.make", decision(2, "ops.calls.make"), T0);

        cache.invalidate_user(1);

        assert!(cache.get(1, "ops.calls.make", T0).is_none());
        assert!(cache.get(2, "ops.calls.make", T0).is_some());
    }

    #[test]
    fn test_eviction_at_capacity() {
        let cache = DecisionCache::new(2, Duration::from_secs(10));
        cache.put(1, "a.b.c", decision(1, "a.b.c"), T0);
        cache.put(2, "a.b.c", decision(2, "a.b.c"), T0);
        cache.put(3, "a.b.c", decision(3, "a.b.c"), T0);

        assert!(cache.stats().size <= 2);
    }
}
