// SPDX-License-Identifier: MPL-2.0
//! LRU cache of evicted tile pixels.
//!
//! When a tile scrolls out of view its pixels are released. With a non-zero
//! capacity they are parked here instead, and a tile that scrolls back in is
//! restored without a decode.
//!
//! # Design
//!
//! - **LRU eviction**: Least recently parked tiles are dropped first
//! - **Count-bounded**: Capacity is a number of tiles, 0 disables the cache
//! - **Grid-keyed**: Entries are indexed by divisor, row and column, so a
//!   rebuilt grid at the same divisor finds its tiles again. The key carries
//!   no source identity: the owner clears the cache whenever the source or
//!   its orientation changes

use crate::media::TilePixels;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Location of a tile within any grid of a given divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCacheKey {
    pub divisor: u32,
    pub row: u32,
    pub col: u32,
}

/// Statistics about tile cache performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileCacheStats {
    /// Number of tiles restored from the cache.
    pub hits: u64,

    /// Number of lookups that found nothing.
    pub misses: u64,

    /// Number of tiles dropped to make room.
    pub evictions: u64,

    /// Number of tiles parked.
    pub insertions: u64,
}

pub struct TileCache {
    /// `None` when caching is disabled.
    cache: Option<LruCache<TileCacheKey, TilePixels>>,
    current_bytes: usize,
    stats: TileCacheStats,
}

impl TileCache {
    /// Creates a cache holding up to `capacity` tiles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
            current_bytes: 0,
            stats: TileCacheStats::default(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Parks a tile's pixels.
    ///
    /// Returns `false` if caching is disabled.
    pub fn insert(&mut self, key: TileCacheKey, pixels: TilePixels) -> bool {
        let Some(cache) = self.cache.as_mut() else {
            return false;
        };

        self.current_bytes += pixels.size_bytes();
        if let Some((old_key, old)) = cache.push(key, pixels) {
            self.current_bytes = self.current_bytes.saturating_sub(old.size_bytes());
            if old_key != key {
                self.stats.evictions += 1;
            }
        }
        self.stats.insertions += 1;
        true
    }

    /// Removes and returns a parked tile.
    pub fn take(&mut self, key: &TileCacheKey) -> Option<TilePixels> {
        let cache = self.cache.as_mut()?;
        match cache.pop(key) {
            Some(pixels) => {
                self.current_bytes = self.current_bytes.saturating_sub(pixels.size_bytes());
                self.stats.hits += 1;
                Some(pixels)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Drops every parked tile.
    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
        self.current_bytes = 0;
    }

    #[must_use]
    pub fn stats(&self) -> TileCacheStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.current_bytes
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("len", &self.len())
            .field("current_bytes", &self.current_bytes)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(row: u32, col: u32) -> TileCacheKey {
        TileCacheKey { divisor: 1, row, col }
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let mut cache = TileCache::new(0);
        assert!(!cache.is_enabled());
        assert!(!cache.insert(key(0, 0), TilePixels::blank(2, 2)));
        assert!(cache.take(&key(0, 0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn take_restores_and_removes() {
        let mut cache = TileCache::new(4);
        assert!(cache.insert(key(1, 2), TilePixels::blank(2, 2)));
        assert_eq!(cache.memory_usage(), 16);

        let pixels = cache.take(&key(1, 2)).expect("tile was parked");
        assert_eq!(pixels.width, 2);
        assert!(cache.take(&key(1, 2)).is_none());
        assert_eq!(cache.memory_usage(), 0);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn least_recent_tile_is_evicted() {
        let mut cache = TileCache::new(2);
        cache.insert(key(0, 0), TilePixels::blank(1, 1));
        cache.insert(key(0, 1), TilePixels::blank(1, 1));
        cache.insert(key(0, 2), TilePixels::blank(1, 1));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.take(&key(0, 0)).is_none());
        assert!(cache.take(&key(0, 2)).is_some());
    }

    #[test]
    fn reinserting_same_key_is_not_an_eviction() {
        let mut cache = TileCache::new(2);
        cache.insert(key(0, 0), TilePixels::blank(1, 1));
        cache.insert(key(0, 0), TilePixels::blank(2, 1));
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.memory_usage(), 8);
    }

    #[test]
    fn clear_resets_usage() {
        let mut cache = TileCache::new(3);
        cache.insert(key(0, 0), TilePixels::blank(4, 4));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }
}
