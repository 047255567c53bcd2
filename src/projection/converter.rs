use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{
    core::{
        camera::CameraSignature,
        geo::{CoordKey, LatLng, Point},
    },
    surface::MapSurface,
    traits::{CacheStats, Cacheable},
};

/// Geographic to screen conversion with a per-camera cache.
///
/// Every answer is valid for exactly one camera signature; when the surface
/// reports a different signature the whole cache is dropped at once.
/// Projection errors never escape: they are logged and read as "not shown".
#[derive(Debug)]
pub struct CoordinateConverter {
    cache: LruCache<CoordKey, Option<Point>>,
    signature: Option<CameraSignature>,
    hits: u64,
    misses: u64,
    invalidations: u64,
}

impl CoordinateConverter {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            signature: None,
            hits: 0,
            misses: 0,
            invalidations: 0,
        }
    }

    /// Screen position of `at`, or `None` if the surface is not ready, the
    /// point is off screen, or the projection failed
    pub fn to_screen(&mut self, surface: &dyn MapSurface, at: LatLng) -> Option<Point> {
        if !surface.is_ready() {
            return None;
        }
        let signature = surface.camera_signature()?;
        self.sync_signature(signature);

        let key = at.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            return *cached;
        }
        self.misses += 1;

        match surface.world_to_screen(at) {
            Ok(position) => {
                self.cache.put(key, position);
                position
            }
            Err(e) => {
                log::debug!("projection of {:?} failed: {}", at, e);
                None
            }
        }
    }

    /// Order-preserving batch form of [`to_screen`](Self::to_screen)
    pub fn to_screen_batch(&mut self, surface: &dyn MapSurface, points: &[LatLng]) -> Vec<Option<Point>> {
        points.iter().map(|at| self.to_screen(surface, *at)).collect()
    }

    /// Reverse conversion. Not cached.
    pub fn to_world(&self, surface: &dyn MapSurface, point: Point) -> Option<LatLng> {
        if !surface.is_ready() {
            return None;
        }
        surface.screen_to_world(point).unwrap_or_else(|e| {
            log::debug!("reverse projection of {:?} failed: {}", point, e);
            None
        })
    }

    /// Whether `at` lies inside the surface's visible region
    pub fn is_visible(&self, surface: &dyn MapSurface, at: LatLng) -> bool {
        if !surface.is_ready() {
            return false;
        }
        match surface.visible_region() {
            Ok(Some(region)) => region.contains(&at),
            Ok(None) => false,
            Err(e) => {
                log::debug!("visible region unavailable: {}", e);
                false
            }
        }
    }

    /// Pixel distance between two points, infinite if either is not projectable
    pub fn pixel_distance(&mut self, surface: &dyn MapSurface, a: LatLng, b: LatLng) -> f64 {
        match (self.to_screen(surface, a), self.to_screen(surface, b)) {
            (Some(a), Some(b)) => a.distance_to(&b),
            _ => f64::INFINITY,
        }
    }

    /// Drops every cached position
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            self.invalidations += 1;
        }
        self.cache.clear();
        self.signature = None;
    }

    pub fn signature(&self) -> Option<CameraSignature> {
        self.signature
    }

    /// How many times the cache was dropped because the camera moved
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
        }
    }

    fn sync_signature(&mut self, signature: CameraSignature) {
        if self.signature != Some(signature) {
            if !self.cache.is_empty() {
                log::debug!(
                    "camera signature changed, dropping {} cached positions",
                    self.cache.len()
                );
                self.invalidations += 1;
            }
            self.cache.clear();
            self.signature = Some(signature);
        }
    }
}

impl Cacheable for CoordinateConverter {
    fn clear_cache(&mut self) {
        self.invalidate();
    }

    fn cache_stats(&self) -> CacheStats {
        self.stats()
    }
}

impl Default for CoordinateConverter {
    fn default() -> Self {
        Self::new(crate::core::config::CacheConfig::default().position_capacity)
    }
}
