//! A bounded cache of decoded animations keyed by identity.
//!
//! Entries remember when they were last used. Inserting past the size threshold
//! sweeps out every entry that has gone unused for longer than the configured
//! time; recently used entries survive even if the cache stays over its threshold.
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::time::Duration;

use tracing::debug;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    last_used: Duration,
}

impl<V> Entry<V> {
    fn is_unused(&self, ttl: Duration, now: Duration) -> bool {
        self.last_used + ttl < now
    }
}

/// Map from key to value with last-used timestamps and sweep-on-insert eviction.
///
/// Timestamps are supplied by the caller, usually from a [`Clock`](crate::Clock).
#[derive(Debug, Clone)]
pub struct LastUsedCache<K, V> {
    entries: BTreeMap<K, Entry<V>>,
    max_entries: usize,
    unused_ttl: Duration,
}

impl<K: Ord, V> Default for LastUsedCache<K, V> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ENTRIES, Self::DEFAULT_UNUSED_TTL)
    }
}

impl<K: Ord, V> LastUsedCache<K, V> {
    /// Entry count above which an insert triggers a sweep.
    pub const DEFAULT_MAX_ENTRIES: usize = 128;
    /// How long an entry may go unused before a sweep evicts it.
    pub const DEFAULT_UNUSED_TTL: Duration = Duration::from_secs(30);

    /// An empty cache.
    #[must_use]
    pub fn new(max_entries: usize, unused_ttl: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_entries,
            unused_ttl,
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is cached. Does not count as a use.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Stores `value` as used at `now`, replacing any previous value for `key`.
    ///
    /// When the cache then holds more than its maximum, unused entries are swept and
    /// returned so the caller can release what they own.
    pub fn insert(&mut self, key: K, value: V, now: Duration) -> Vec<(K, V)> {
        self.entries.insert(
            key,
            Entry {
                value,
                last_used: now,
            },
        );
        if self.entries.len() > self.max_entries {
            self.sweep(now)
        } else {
            Vec::new()
        }
    }

    /// Looks up `key` and marks it used at `now`.
    pub fn get<Q>(&mut self, key: &Q, now: Duration) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key, now).map(|value| &*value)
    }

    /// Mutable lookup, marking `key` used at `now`.
    pub fn get_mut<Q>(&mut self, key: &Q, now: Duration) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let entry = self.entries.get_mut(key)?;
        entry.last_used = now;
        Some(&mut entry.value)
    }

    /// Looks up `key` without marking it used.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Marks `key` used at `now`, returning whether it was cached.
    pub fn touch<Q>(&mut self, key: &Q, now: Duration) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key, now).is_some()
    }

    /// Removes `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Evicts every entry unused for longer than the configured time.
    pub fn sweep(&mut self, now: Duration) -> Vec<(K, V)> {
        let ttl = self.unused_ttl;
        let mut evicted = Vec::new();
        for (key, entry) in core::mem::take(&mut self.entries) {
            if entry.is_unused(ttl, now) {
                evicted.push((key, entry.value));
            } else {
                self.entries.insert(key, entry);
            }
        }
        if !evicted.is_empty() {
            debug!(
                "evicted {} unused entries, {} remain",
                evicted.len(),
                self.entries.len()
            );
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn no_sweep_below_threshold() {
        let mut cache = LastUsedCache::new(2, secs(10));
        assert!(cache.insert("a", 1, secs(0)).is_empty());
        assert!(cache.insert("b", 2, secs(100)).is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn sweep_evicts_only_unused() {
        let mut cache = LastUsedCache::new(2, secs(10));
        cache.insert("old", 1, secs(0));
        cache.insert("used", 2, secs(0));
        assert_eq!(cache.get("used", secs(15)), Some(&2));
        let evicted = cache.insert("new", 3, secs(20));
        assert_eq!(evicted, [("old", 1)]);
        assert!(cache.contains_key("used"));
        assert!(cache.contains_key("new"));
    }

    #[test]
    fn recently_used_entries_survive_over_threshold() {
        let mut cache = LastUsedCache::new(1, secs(10));
        cache.insert("a", 1, secs(0));
        let evicted = cache.insert("b", 2, secs(5));
        assert!(evicted.is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn peek_does_not_refresh() {
        let mut cache = LastUsedCache::new(1, secs(10));
        cache.insert("a", 1, secs(0));
        assert_eq!(cache.peek("a"), Some(&1));
        let evicted = cache.insert("b", 2, secs(11));
        assert_eq!(evicted, [("a", 1)]);
    }

    #[test]
    fn expiry_is_strict() {
        let mut cache = LastUsedCache::new(0, secs(10));
        cache.insert("a", 1, secs(0));
        assert!(cache.sweep(secs(10)).is_empty());
        assert_eq!(cache.sweep(secs(11)), [("a", 1)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_and_touch() {
        let mut cache: LastUsedCache<&str, i32> = LastUsedCache::default();
        assert!(!cache.touch("a", secs(1)));
        cache.insert("a", 1, secs(0));
        assert!(cache.touch("a", secs(1)));
        assert_eq!(cache.remove("a"), Some(1));
        assert!(cache.is_empty());
    }
}
