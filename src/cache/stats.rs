//! Cache Statistics Module
//!
//! Counters a cache keeps about its own traffic. Snapshots are taken under
//! the cache lock, so every field in one snapshot is consistent.

use std::fmt;

use serde::Serialize;

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live element
    pub hits: u64,
    /// Lookups for absent or expired keys
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed, on read or by a sweep
    pub expirations: u64,
    /// Entries held when the snapshot was taken
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one lookup.
    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        match self.lookups() {
            0 => None,
            total => Some(self.hits as f64 / total as f64),
        }
    }

    /// Copy of the counters stamped with the current entry count.
    pub(crate) fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries={} hits={} misses={} evictions={} expirations={}",
            self.total_entries, self.hits, self.misses, self.evictions, self.expirations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_before_any_lookup() {
        let stats = CacheStats::new();
        assert_eq!(stats.lookups(), 0);
        assert_eq!(stats.hit_rate(), None);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        for hit in [true, true, true, false] {
            stats.record_lookup(hit);
        }
        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_rate(), Some(0.75));
    }

    #[test]
    fn test_snapshot_keeps_counters() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_expirations(3);
        stats.record_expirations(0);

        let snapshot = stats.snapshot(7);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.expirations, 3);
        assert_eq!(snapshot.total_entries, 7);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_display_and_json() {
        let mut stats = CacheStats::new();
        stats.record_lookup(true);
        let stats = stats.snapshot(4);

        assert_eq!(
            stats.to_string(),
            "entries=4 hits=1 misses=0 evictions=0 expirations=0"
        );
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["total_entries"], 4);
    }
}
