//! The interactive layer: transparent hit targets stacked above everything.

use crate::{
    core::{
        constants::INTERACTIVE_LAYER_Z_INDEX,
        geo::{LatLng, Point, ScreenRect},
    },
    data::poi::PoiId,
    layers::{
        base::{LayerKind, LayerProperties, MarkerTap, OverlayLayer},
        positioner::MarkerPosition,
    },
    spatial::index::{SpatialIndex, SpatialItem},
};

/// A transparent, tappable square centered on a marker
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub poi: PoiId,
    pub position: LatLng,
    pub center: Point,
    pub rect: ScreenRect,
    /// Draw order; the highest order is on top
    pub order: usize,
}

#[derive(Debug)]
pub struct InteractiveLayer {
    properties: LayerProperties,
    targets: Vec<HitTarget>,
    index: SpatialIndex<usize>,
}

impl InteractiveLayer {
    pub fn new() -> Self {
        Self {
            properties: LayerProperties::new(
                "interactive".to_string(),
                "Marker hit targets".to_string(),
                LayerKind::Interactive,
            )
            .with_z_index(INTERACTIVE_LAYER_Z_INDEX),
            targets: Vec::new(),
            index: SpatialIndex::new(),
        }
    }

    /// Replaces every hit target. `size` gives the side of each target;
    /// `selected` is drawn above all others.
    pub fn rebuild(
        &mut self,
        positions: &[MarkerPosition],
        selected: Option<&PoiId>,
        mut size: impl FnMut(&MarkerPosition) -> f64,
    ) {
        self.targets = positions
            .iter()
            .map(|position| {
                let order = if selected == Some(&position.poi) {
                    usize::MAX
                } else {
                    position.order
                };
                HitTarget {
                    poi: position.poi.clone(),
                    position: position.position,
                    center: position.screen,
                    rect: ScreenRect::from_center_size(position.screen, size(position)),
                    order,
                }
            })
            .collect();
        self.targets.sort_by_key(|target| target.order);

        let items = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| SpatialItem::new(target.rect, i))
            .collect();
        self.index.rebuild(items);
    }

    /// Topmost target under `point`; equal orders go to the nearest center
    pub fn target_at(&self, point: &Point) -> Option<&HitTarget> {
        self.index
            .query_point(point)
            .into_iter()
            .filter_map(|item| self.targets.get(item.data))
            .max_by(|a, b| {
                a.order.cmp(&b.order).then_with(|| {
                    b.center
                        .distance_to(point)
                        .partial_cmp(&a.center.distance_to(point))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
            })
    }

    /// Targets in draw order, bottom first
    pub fn targets(&self) -> &[HitTarget] {
        &self.targets
    }

    pub fn target(&self, poi: &PoiId) -> Option<&HitTarget> {
        self.targets.iter().find(|target| &target.poi == poi)
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for InteractiveLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayLayer for InteractiveLayer {
    crate::impl_overlay_layer!(properties);

    fn hit_test(&self, point: &Point) -> Option<MarkerTap> {
        self.target_at(point).map(|target| MarkerTap {
            poi: target.poi.clone(),
            position: target.position,
            at: *point,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: &str, x: f64, y: f64, order: usize) -> MarkerPosition {
        MarkerPosition {
            poi: PoiId::from(id),
            position: LatLng::new(44.6, 40.1),
            screen: Point::new(x, y),
            order,
        }
    }

    #[test]
    fn test_targets_are_enlarged_squares() {
        let mut layer = InteractiveLayer::new();
        layer.rebuild(&[position("a", 100.0, 100.0, 0)], None, |_| 56.0 * 1.1);

        let target = &layer.targets()[0];
        assert!((target.rect.width() - 61.6).abs() < 1e-9);
        assert!(layer.target_at(&Point::new(130.0, 100.0)).is_some());
        assert!(layer.target_at(&Point::new(131.0, 100.0)).is_none());
    }

    #[test]
    fn test_topmost_target_wins_overlap() {
        let mut layer = InteractiveLayer::new();
        let positions = [position("below", 100.0, 100.0, 0), position("above", 120.0, 100.0, 1)];
        layer.rebuild(&positions, None, |_| 60.0);

        // Closer to "below", but "above" is drawn on top.
        let hit = layer.target_at(&Point::new(105.0, 100.0)).unwrap();
        assert_eq!(hit.poi.as_str(), "above");
    }

    #[test]
    fn test_selected_target_is_on_top() {
        let mut layer = InteractiveLayer::new();
        let positions = [position("below", 100.0, 100.0, 0), position("above", 120.0, 100.0, 1)];
        let selected = PoiId::from("below");
        layer.rebuild(&positions, Some(&selected), |_| 60.0);

        assert_eq!(layer.target_at(&Point::new(118.0, 100.0)).unwrap().poi, selected);
        assert_eq!(layer.targets().last().unwrap().poi, selected);
    }

    #[test]
    fn test_hit_test_reports_tap() {
        let mut layer = InteractiveLayer::new();
        layer.rebuild(&[position("a", 100.0, 100.0, 0)], None, |_| 60.0);

        assert!(layer.receives_input());
        let tap = layer.hit_test(&Point::new(90.0, 95.0)).unwrap();
        assert_eq!(tap.poi.as_str(), "a");
        assert_eq!(tap.at, Point::new(90.0, 95.0));
        assert!(layer.hit_test(&Point::new(500.0, 500.0)).is_none());

        layer.set_visible(false);
        assert!(!layer.receives_input());
    }
}
