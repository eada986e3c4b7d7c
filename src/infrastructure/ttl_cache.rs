use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct CachedEntry<V> {
    inserted_at: Instant,
    value: V,
}

/// Read-through cache with time-based expiry and a hard size cap.
///
/// Lookups and inserts take the read/write lock briefly; the periodic eviction
/// pass is the only bulk writer and runs concurrently with in-flight fetches.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CachedEntry<V>>>,
    ttl: Duration,
    max_size: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_size,
        }
    }

    /// Stores `value` under `key`, overwriting and re-stamping any prior entry.
    pub fn put(&self, key: K, value: V) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CachedEntry {
                inserted_at: Instant::now(),
                value,
            },
        );
    }

    /// Returns the cached value while it is younger than the TTL. Expired
    /// entries behave as a miss but stay in the map until the next eviction.
    pub fn get_if_valid(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Drops every expired entry, then the oldest surviving entries until the
    /// map is back at or under capacity.
    pub fn evict_expired_and_overflow(&self) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);

        if entries.len() > self.max_size {
            let mut by_recency: Vec<(K, Instant)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.inserted_at))
                .collect();
            by_recency.sort_by(|a, b| b.1.cmp(&a.1));
            for (key, _) in &by_recency[self.max_size..] {
                entries.remove(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let cache = TtlCache::new(Duration::from_secs(60), 10);
        cache.put(1, "a");
        assert_eq!(cache.get_if_valid(&1), Some("a"));
        assert_eq!(cache.get_if_valid(&2), None);
    }

    #[test]
    fn expired_entry_is_a_miss_but_not_evicted() {
        let cache = TtlCache::new(Duration::from_millis(20), 10);
        cache.put(1, "a");
        std::thread::sleep(Duration::from_millis(35));
        assert_eq!(cache.get_if_valid(&1), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn eviction_removes_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(20), 10);
        cache.put(1, "a");
        std::thread::sleep(Duration::from_millis(35));
        cache.put(2, "b");
        cache.evict_expired_and_overflow();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_if_valid(&2), Some("b"));
    }

    #[test]
    fn eviction_keeps_the_most_recently_inserted_under_capacity() {
        let cache = TtlCache::new(Duration::from_secs(60), 3);
        for i in 0..4 {
            cache.put(i, i);
            std::thread::sleep(Duration::from_millis(5));
        }
        cache.evict_expired_and_overflow();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get_if_valid(&0), None);
        for i in 1..4 {
            assert_eq!(cache.get_if_valid(&i), Some(i));
        }
    }

    #[test]
    fn overwrite_refreshes_insertion_time() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.put(1, "old");
        std::thread::sleep(Duration::from_millis(5));
        cache.put(2, "b");
        std::thread::sleep(Duration::from_millis(5));
        cache.put(3, "c");
        std::thread::sleep(Duration::from_millis(5));
        // Entry 1 becomes the newest again and survives the capacity cut.
        cache.put(1, "new");
        cache.evict_expired_and_overflow();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_if_valid(&1), Some("new"));
        assert_eq!(cache.get_if_valid(&2), None);
    }
}
