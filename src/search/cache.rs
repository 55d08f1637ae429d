//! Bounded per-session result cache.
//!
//! Eviction is by insertion order (FIFO), not access order: a cache hit does
//! not refresh an entry's position. Entries have no TTL; they are valid for
//! the lifetime of the session and never persisted.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::model::SearchResult;
use crate::search::normalize::NormalizedQuery;

/// Default capacity of the per-session cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 5;

/// A cached remote resolution for one normalized query.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Vec<SearchResult>,
    pub search_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(results: Vec<SearchResult>, search_time_ms: u64) -> Self {
        Self {
            results,
            search_time_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded key→entry store with insertion-order eviction.
///
/// Infallible by contract: `get` and `put` never error and never panic.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    entries: HashMap<NormalizedQuery, CacheEntry>,
    insertion_order: VecDeque<NormalizedQuery>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    pub fn get(&self, query: &NormalizedQuery) -> Option<&CacheEntry> {
        self.entries.get(query)
    }

    /// Insert an entry, evicting the earliest-inserted key at capacity.
    /// Re-inserting an existing key replaces its value in place.
    pub fn put(&mut self, query: NormalizedQuery, entry: CacheEntry) {
        if self.entries.contains_key(&query) {
            self.entries.insert(query, entry);
            return;
        }
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self.insertion_order.pop_front()
        {
            tracing::debug!(evicted = %oldest, "result cache at capacity");
            self.entries.remove(&oldest);
        }
        self.insertion_order.push_back(query.clone());
        self.entries.insert(query, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry() -> CacheEntry {
        CacheEntry::new(Vec::new(), 12)
    }

    fn q(s: &str) -> NormalizedQuery {
        NormalizedQuery::new(s)
    }

    #[test]
    fn sixth_insert_evicts_first_key() {
        let mut cache = ResultCache::default();
        for name in ["one", "two", "three", "four", "five", "six"] {
            cache.put(q(name), entry());
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.get(&q("one")).is_none());
        assert!(cache.get(&q("two")).is_some());
        assert!(cache.get(&q("six")).is_some());
    }

    #[test]
    fn get_does_not_refresh_insertion_order() {
        let mut cache = ResultCache::new(2);
        cache.put(q("a"), entry());
        cache.put(q("b"), entry());
        // An LRU would keep "a" alive after this read; FIFO must not.
        assert!(cache.get(&q("a")).is_some());
        cache.put(q("c"), entry());
        assert!(cache.get(&q("a")).is_none());
        assert!(cache.get(&q("b")).is_some());
    }

    #[test]
    fn reinsert_replaces_without_eviction() {
        let mut cache = ResultCache::new(2);
        cache.put(q("a"), entry());
        cache.put(q("b"), entry());
        cache.put(q("a"), CacheEntry::new(Vec::new(), 99));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&q("a")).unwrap().search_time_ms, 99);
        assert!(cache.get(&q("b")).is_some());
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(keys in proptest::collection::vec("[a-z]{1,8}", 0..64)) {
            let mut cache = ResultCache::default();
            for k in &keys {
                cache.put(q(k), entry());
            }
            prop_assert!(cache.len() <= DEFAULT_CACHE_CAPACITY);
        }
    }
}
