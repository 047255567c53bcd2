use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{
    data::poi::PoiId,
    imaging::icon::{IconVariant, MarkerIcon},
    traits::{CacheStats, Cacheable},
};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Composed marker icons keyed by POI and variant, so that toggling the
/// selection does not refetch or recompose photos.
///
/// Lives on the main context only; no locking.
#[derive(Debug)]
pub struct IconCache {
    cache: LruCache<(PoiId, IconVariant), MarkerIcon>,
    hits: u64,
    misses: u64,
}

impl IconCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up an icon and marks it as recently used
    pub fn get(&mut self, poi: &PoiId, variant: IconVariant) -> Option<MarkerIcon> {
        match self.cache.get(&(poi.clone(), variant)) {
            Some(icon) => {
                self.hits += 1;
                Some(icon.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, poi: PoiId, variant: IconVariant, icon: MarkerIcon) {
        self.cache.put((poi, variant), icon);
    }

    /// Drops both variants of a POI
    pub fn remove_poi(&mut self, poi: &PoiId) {
        self.cache.pop(&(poi.clone(), IconVariant::Regular));
        self.cache.pop(&(poi.clone(), IconVariant::Selected));
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}

impl Cacheable for IconCache {
    fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn icon() -> MarkerIcon {
        MarkerIcon::new(RgbaImage::new(2, 2), true)
    }

    #[test]
    fn test_variants_are_cached_separately() {
        let mut cache = IconCache::new(8);
        let id = PoiId::from("azish-tau");

        cache.put(id.clone(), IconVariant::Regular, icon());
        assert!(cache.get(&id, IconVariant::Selected).is_none());
        assert!(cache.get(&id, IconVariant::Regular).is_some());

        let stats = cache.cache_stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn test_remove_poi_drops_both_variants() {
        let mut cache = IconCache::new(8);
        let id = PoiId::from("big-azish-cave");
        cache.put(id.clone(), IconVariant::Regular, icon());
        cache.put(id.clone(), IconVariant::Selected, icon());
        cache.put(PoiId::from("other"), IconVariant::Regular, icon());

        cache.remove_poi(&id);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = IconCache::new(2);
        let (a, b, c) = (PoiId::from("a"), PoiId::from("b"), PoiId::from("c"));
        cache.put(a.clone(), IconVariant::Regular, icon());
        cache.put(b.clone(), IconVariant::Regular, icon());
        cache.get(&a, IconVariant::Regular);
        cache.put(c.clone(), IconVariant::Regular, icon());

        assert!(cache.get(&a, IconVariant::Regular).is_some());
        assert!(cache.get(&b, IconVariant::Regular).is_none());
        assert!(cache.get(&c, IconVariant::Regular).is_some());
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let mut cache = IconCache::new(0);
        cache.put(PoiId::from("a"), IconVariant::Regular, icon());
        cache.put(PoiId::from("b"), IconVariant::Regular, icon());
        assert_eq!(cache.len(), 2);

        cache.clear_cache();
        assert!(cache.is_empty());
    }
}
