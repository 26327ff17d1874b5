//! Bounded result cache.
//!
//! Eviction is FIFO by insertion: overwriting a live key keeps its original
//! position, and hits do not refresh it.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::core::types::{Filters, PromptResult};

const ANY: &str = "any";

/// (user, garment type, season, occasion); absent filters read as "any".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: String,
    pub garment_type: String,
    pub season: String,
    pub occasion: String,
}

impl CacheKey {
    pub fn new(user_id: &str, filters: &Filters) -> Self {
        let part = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(|| ANY.to_string(), str::to_lowercase)
        };
        Self {
            user_id: user_id.to_string(),
            garment_type: part(&filters.garment_type),
            season: part(&filters.season),
            occasion: part(&filters.occasion),
        }
    }
}

/// Injected result cache.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<PromptResult>;

    fn set(&self, key: CacheKey, result: PromptResult);

    /// Drop every entry for `user_id`; returns how many were removed.
    fn evict_user(&self, user_id: &str) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct FifoState {
    entries: HashMap<CacheKey, PromptResult>,
    order: VecDeque<CacheKey>,
}

/// In-process FIFO cache with a fixed capacity.
#[derive(Debug)]
pub struct FifoCache {
    capacity: usize,
    state: Mutex<FifoState>,
}

impl FifoCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(FifoState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FifoState> {
        // Entries are plain values; a panicked writer cannot leave them torn.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ResultCache for FifoCache {
    fn get(&self, key: &CacheKey) -> Option<PromptResult> {
        self.lock().entries.get(key).cloned()
    }

    fn set(&self, key: CacheKey, result: PromptResult) {
        let mut state = self.lock();
        if state.entries.insert(key.clone(), result).is_some() {
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                tracing::debug!(user_id = %oldest.user_id, "evicted oldest cache entry");
            }
        }
    }

    fn evict_user(&self, user_id: &str) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| key.user_id != user_id);
        state.order.retain(|key| key.user_id != user_id);
        before - state.entries.len()
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::prompt_result as result;

    fn key(user: &str, garment: Option<&str>) -> CacheKey {
        CacheKey::new(
            user,
            &Filters {
                garment_type: garment.map(Into::into),
                ..Filters::default()
            },
        )
    }

    #[test]
    fn missing_filters_read_as_any() {
        let key = CacheKey::new("u1", &Filters::default());
        assert_eq!(key.garment_type, "any");
        assert_eq!(key.season, "any");
        assert_eq!(key.occasion, "any");
        assert_eq!(
            CacheKey::new(
                "u1",
                &Filters {
                    season: Some(" Fall ".into()),
                    ..Filters::default()
                }
            )
            .season,
            "fall"
        );
    }

    #[test]
    fn hit_returns_stored_result() {
        let cache = FifoCache::new(4);
        let stored = result("a");
        cache.set(key("u1", None), stored.clone());
        assert_eq!(cache.get(&key("u1", None)), Some(stored));
        assert!(cache.get(&key("u1", Some("dress"))).is_none());
    }

    #[test]
    fn evicts_oldest_inserted_not_least_recent() {
        let cache = FifoCache::new(2);
        cache.set(key("u1", Some("a")), result("a"));
        cache.set(key("u1", Some("b")), result("b"));
        // A hit does not refresh position.
        assert!(cache.get(&key("u1", Some("a"))).is_some());
        cache.set(key("u1", Some("c")), result("c"));

        assert!(cache.get(&key("u1", Some("a"))).is_none());
        assert!(cache.get(&key("u1", Some("b"))).is_some());
        assert!(cache.get(&key("u1", Some("c"))).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let cache = FifoCache::new(2);
        cache.set(key("u1", Some("a")), result("a1"));
        cache.set(key("u1", Some("b")), result("b"));
        cache.set(key("u1", Some("a")), result("a2"));
        assert_eq!(cache.get(&key("u1", Some("a"))).unwrap().positive_prompt, "a2");

        cache.set(key("u1", Some("c")), result("c"));
        assert!(cache.get(&key("u1", Some("a"))).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evict_user_only_touches_that_user() {
        let cache = FifoCache::new(8);
        cache.set(key("u1", Some("a")), result("a"));
        cache.set(key("u1", Some("b")), result("b"));
        cache.set(key("u2", Some("a")), result("c"));

        assert_eq!(cache.evict_user("u1"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("u2", Some("a"))).is_some());
        assert_eq!(cache.evict_user("u1"), 0);
    }
}
