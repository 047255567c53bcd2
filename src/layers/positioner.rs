//! Screen positions of the tracked POIs as derived state.
//!
//! Positions are a pure function of `(camera_version, poi_revision)` and the
//! surface. They are recomputed lazily on the first read after either counter
//! moves, and served from memory otherwise.

use crate::{
    core::geo::{LatLng, Point},
    data::poi::{Poi, PoiId},
    projection::converter::CoordinateConverter,
    surface::MapSurface,
};

/// Where one POI sits on screen for the current camera
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPosition {
    pub poi: PoiId,
    pub position: LatLng,
    pub screen: Point,
    /// Index of the POI in the tracked list; later means drawn on top
    pub order: usize,
}

#[derive(Debug, Default)]
pub struct OverlayPositioner {
    tracked: Vec<Poi>,
    camera_version: u64,
    poi_revision: u64,
    computed_for: Option<(u64, u64)>,
    positions: Vec<MarkerPosition>,
    disposed: bool,
}

impl OverlayPositioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tracked POIs
    pub fn set_pois(&mut self, pois: Vec<Poi>) {
        if self.disposed {
            return;
        }
        self.tracked = pois;
        self.poi_revision += 1;
    }

    /// Records a camera change and returns the new camera version
    pub fn on_camera_changed(&mut self) -> u64 {
        self.camera_version += 1;
        self.camera_version
    }

    /// Positions of every tracked POI that is currently projectable
    pub fn positions(&mut self, surface: &dyn MapSurface, converter: &mut CoordinateConverter) -> &[MarkerPosition] {
        if self.disposed || !surface.is_ready() {
            return &[];
        }

        let key = (self.camera_version, self.poi_revision);
        if self.computed_for != Some(key) {
            self.positions = self
                .tracked
                .iter()
                .enumerate()
                .filter_map(|(order, poi)| {
                    converter.to_screen(surface, poi.position).map(|screen| MarkerPosition {
                        poi: poi.id.clone(),
                        position: poi.position,
                        screen,
                        order,
                    })
                })
                .collect();
            self.computed_for = Some(key);
        }
        &self.positions
    }

    /// Stops all further computation
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.tracked.clear();
        self.positions.clear();
        self.computed_for = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn camera_version(&self) -> u64 {
        self.camera_version
    }

    pub fn tracked(&self) -> &[Poi] {
        &self.tracked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::CameraPose;
    use crate::surface::software::SoftwareSurface;

    fn surface() -> SoftwareSurface {
        SoftwareSurface::new(
            CameraPose::new(LatLng::new(44.6098, 40.1006), 12.0),
            Point::new(1080.0, 1920.0),
        )
    }

    fn pois() -> Vec<Poi> {
        vec![
            Poi::new("center", LatLng::new(44.6098, 40.1006)),
            Poi::new("north", LatLng::new(44.62, 40.1006)),
            Poi::new("moscow", LatLng::new(55.75, 37.61)),
        ]
    }

    #[test]
    fn test_unprojectable_pois_are_dropped() {
        let surface = surface();
        let mut converter = CoordinateConverter::default();
        let mut positioner = OverlayPositioner::new();
        positioner.set_pois(pois());

        let ids: Vec<_> = positioner
            .positions(&surface, &mut converter)
            .iter()
            .map(|p| p.poi.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["center", "north"]);
    }

    #[test]
    fn test_unchanged_inputs_are_memoized() {
        let surface = surface();
        let mut converter = CoordinateConverter::default();
        let mut positioner = OverlayPositioner::new();
        positioner.set_pois(pois());

        let first = positioner.positions(&surface, &mut converter).to_vec();
        let lookups = converter.stats().hits + converter.stats().misses;
        let second = positioner.positions(&surface, &mut converter).to_vec();

        assert_eq!(first, second);
        assert_eq!(converter.stats().hits + converter.stats().misses, lookups);
    }

    #[test]
    fn test_camera_versions_increase() {
        let mut positioner = OverlayPositioner::new();
        let a = positioner.on_camera_changed();
        let b = positioner.on_camera_changed();
        assert!(b > a);
        assert_eq!(positioner.camera_version(), b);
    }

    #[test]
    fn test_camera_change_recomputes() {
        let mut surface = surface();
        let mut converter = CoordinateConverter::default();
        let mut positioner = OverlayPositioner::new();
        positioner.set_pois(pois());
        let before = positioner.positions(&surface, &mut converter)[1].screen;

        surface.move_to(CameraPose::new(LatLng::new(44.6098, 40.1006), 13.0));
        positioner.on_camera_changed();
        let after = positioner.positions(&surface, &mut converter)[1].screen;

        assert!(after.y < before.y);
    }

    #[test]
    fn test_empty_and_disposed_yield_nothing() {
        let mut surface = surface();
        let mut converter = CoordinateConverter::default();
        let mut positioner = OverlayPositioner::new();
        assert!(positioner.positions(&surface, &mut converter).is_empty());

        positioner.set_pois(pois());
        surface.tear_down();
        assert!(positioner.positions(&surface, &mut converter).is_empty());

        positioner.dispose();
        positioner.set_pois(pois());
        assert!(positioner.tracked().is_empty());
    }
}
