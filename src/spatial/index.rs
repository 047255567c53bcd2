use crate::core::geo::{Point, ScreenRect};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A screen-space rectangle that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub bounds: ScreenRect,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(bounds: ScreenRect, data: T) -> Self {
        Self { bounds, data }
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.bounds.center();
        let dx = center.x - point[0];
        let dy = center.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bounds.contains(&Point::new(point[0], point[1]))
    }
}

/// R-tree over screen rectangles, rebuilt wholesale every frame
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self { rtree: RTree::new() }
    }

    /// Replaces the whole index; bulk loading beats repeated inserts
    pub fn rebuild(&mut self, items: Vec<SpatialItem<T>>) {
        self.rtree = RTree::bulk_load(items);
    }

    /// Every item whose rectangle contains `point`
    pub fn query_point(&self, point: &Point) -> Vec<&SpatialItem<T>> {
        self.rtree.locate_all_at_point(&[point.x, point.y]).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_query_returns_all_overlapping() {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![
            SpatialItem::new(ScreenRect::from_center_size(Point::new(10.0, 10.0), 10.0), "a"),
            SpatialItem::new(ScreenRect::from_center_size(Point::new(14.0, 10.0), 10.0), "b"),
            SpatialItem::new(ScreenRect::from_center_size(Point::new(100.0, 100.0), 10.0), "c"),
        ]);

        let mut hits: Vec<_> = index
            .query_point(&Point::new(12.0, 10.0))
            .into_iter()
            .map(|item| item.data)
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["a", "b"]);
        assert!(index.query_point(&Point::new(50.0, 50.0)).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_and_clear_empties() {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![SpatialItem::new(ScreenRect::from_center_size(Point::new(5.0, 5.0), 4.0), 1)]);
        index.rebuild(vec![
            SpatialItem::new(ScreenRect::from_center_size(Point::new(500.0, 5.0), 4.0), 2),
            SpatialItem::new(ScreenRect::from_center_size(Point::new(900.0, 5.0), 4.0), 3),
        ]);

        assert_eq!(index.len(), 2);
        assert!(index.query_point(&Point::new(5.0, 5.0)).is_empty());

        index.clear();
        assert!(index.is_empty());
    }
}
