//! Cache seams shared by the icon and position caches

/// A cache the overlay can empty on teardown and report on
pub trait Cacheable {
    /// Drops every entry
    fn clear_cache(&mut self);

    /// Counters since creation
    fn cache_stats(&self) -> CacheStats;
}

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            size: 2,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
