//! The visual layer: native placemarks owned by the map surface.
//!
//! Placemarks are pixel-locked to the surface's own render loop, which is
//! what keeps them steady during gestures. They never receive taps.

use fxhash::FxHashMap;

use crate::{
    core::{constants::VISUAL_LAYER_Z_INDEX, geo::LatLng},
    data::poi::{Category, Poi, PoiId},
    imaging::icon::{IconVariant, MarkerIcon},
    layers::base::{LayerKind, LayerProperties, OverlayLayer},
    surface::{MapSurface, PlacemarkId},
    Result,
};

/// Progress of a marker's photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageState {
    /// The POI has no photo; the shell is final
    #[default]
    NoPhoto,
    Pending,
    Loaded,
    /// The load failed; the shell stays
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerVisualState {
    pub selected: bool,
    pub image: ImageState,
}

impl MarkerVisualState {
    pub fn variant(&self) -> IconVariant {
        IconVariant::from(self.selected)
    }
}

/// One placemark and what the overlay knows about it
#[derive(Debug, Clone)]
pub struct NativeMarker {
    pub placemark: PlacemarkId,
    pub position: LatLng,
    pub category: Category,
    pub photo: Option<String>,
    pub state: MarkerVisualState,
}

impl NativeMarker {
    /// Whether `poi` can keep this placemark as it is
    pub fn matches(&self, poi: &Poi) -> bool {
        self.position == poi.position && self.category == poi.category && self.photo.as_deref() == poi.first_photo()
    }
}

/// Result of reconciling the placemarks with a new POI list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    /// Re-created because position, category or photo changed
    pub moved: usize,
    pub unchanged: usize,
    /// Placemark operations the surface refused
    pub failed: usize,
}

impl SyncReport {
    /// Number of placemark mutations performed
    pub fn mutations(&self) -> usize {
        self.added + self.removed + 2 * self.moved
    }
}

#[derive(Debug)]
pub struct VisualLayer {
    properties: LayerProperties,
    markers: FxHashMap<PoiId, NativeMarker>,
}

impl VisualLayer {
    pub fn new() -> Self {
        Self {
            properties: LayerProperties::new("visual".to_string(), "Native markers".to_string(), LayerKind::Visual)
                .with_z_index(VISUAL_LAYER_Z_INDEX),
            markers: FxHashMap::default(),
        }
    }

    /// Creates the placemark for `poi`
    pub fn insert(
        &mut self,
        surface: &mut dyn MapSurface,
        poi: &Poi,
        icon: MarkerIcon,
        state: MarkerVisualState,
    ) -> Result<PlacemarkId> {
        let placemark = surface.add_placemark(poi.position, icon, self.properties.z_index)?;
        self.markers.insert(
            poi.id.clone(),
            NativeMarker {
                placemark,
                position: poi.position,
                category: poi.category,
                photo: poi.first_photo().map(str::to_string),
                state,
            },
        );
        Ok(placemark)
    }

    /// Removes the placemark of `poi`. The marker is forgotten even if the
    /// surface refuses, since the surface is then the one out of sync.
    pub fn remove(&mut self, surface: &mut dyn MapSurface, poi: &PoiId) -> Result<Option<NativeMarker>> {
        match self.markers.remove(poi) {
            Some(marker) => {
                surface.remove_placemark(marker.placemark)?;
                Ok(Some(marker))
            }
            None => Ok(None),
        }
    }

    /// Swaps the icon of an existing placemark
    pub fn set_icon(
        &mut self,
        surface: &mut dyn MapSurface,
        poi: &PoiId,
        icon: MarkerIcon,
        state: MarkerVisualState,
    ) -> Result<bool> {
        let Some(marker) = self.markers.get_mut(poi) else {
            return Ok(false);
        };
        surface.set_placemark_icon(marker.placemark, icon)?;
        marker.state = state;
        Ok(true)
    }

    pub fn set_state(&mut self, poi: &PoiId, state: MarkerVisualState) {
        if let Some(marker) = self.markers.get_mut(poi) {
            marker.state = state;
        }
    }

    /// Removes every placemark from the surface
    pub fn clear(&mut self, surface: &mut dyn MapSurface) -> usize {
        let mut removed = 0;
        for (poi, marker) in self.markers.drain() {
            match surface.remove_placemark(marker.placemark) {
                Ok(()) => removed += 1,
                Err(e) => log::debug!("placemark of {} already gone: {}", poi, e),
            }
        }
        removed
    }

    /// Drops the registry without touching the surface, for surfaces that are gone
    pub fn forget_all(&mut self) {
        self.markers.clear();
    }

    pub fn get(&self, poi: &PoiId) -> Option<&NativeMarker> {
        self.markers.get(poi)
    }

    pub fn contains(&self, poi: &PoiId) -> bool {
        self.markers.contains_key(poi)
    }

    pub fn markers(&self) -> impl Iterator<Item = (&PoiId, &NativeMarker)> {
        self.markers.iter()
    }

    pub fn ids(&self) -> Vec<PoiId> {
        self.markers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for VisualLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayLayer for VisualLayer {
    crate::impl_overlay_layer!(properties);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{camera::CameraPose, geo::Point};
    use crate::surface::software::SoftwareSurface;
    use image::RgbaImage;

    fn surface() -> SoftwareSurface {
        SoftwareSurface::new(
            CameraPose::new(LatLng::new(44.6098, 40.1006), 12.0),
            Point::new(1080.0, 1920.0),
        )
    }

    fn icon() -> MarkerIcon {
        MarkerIcon::new(RgbaImage::new(4, 4), false)
    }

    #[test]
    fn test_insert_remove_round_trip() {
        let mut surface = surface();
        let mut layer = VisualLayer::new();
        let poi = Poi::new("dakh", LatLng::new(44.60, 40.10));

        let placemark = layer.insert(&mut surface, &poi, icon(), MarkerVisualState::default()).unwrap();
        assert_eq!(surface.placemark(placemark).unwrap().z_index, VISUAL_LAYER_Z_INDEX);
        assert!(layer.contains(&poi.id));

        assert!(layer.remove(&mut surface, &poi.id).unwrap().is_some());
        assert!(layer.remove(&mut surface, &poi.id).unwrap().is_none());
        assert_eq!(surface.placemark_count(), 0);
    }

    #[test]
    fn test_set_icon_updates_state() {
        let mut surface = surface();
        let mut layer = VisualLayer::new();
        let poi = Poi::new("dakh", LatLng::new(44.60, 40.10));
        layer.insert(&mut surface, &poi, icon(), MarkerVisualState::default()).unwrap();

        let loaded = MarkerVisualState {
            selected: true,
            image: ImageState::Loaded,
        };
        assert!(layer.set_icon(&mut surface, &poi.id, icon(), loaded).unwrap());
        assert_eq!(layer.get(&poi.id).unwrap().state, loaded);
        assert!(!layer.set_icon(&mut surface, &PoiId::from("nope"), icon(), loaded).unwrap());
        assert_eq!(surface.mutation_stats().icon_updates, 1);
    }

    #[test]
    fn test_marker_matching() {
        let mut surface = surface();
        let mut layer = VisualLayer::new();
        let poi = Poi::new("dakh", LatLng::new(44.60, 40.10)).with_photo("https://x/1.jpg");
        layer.insert(&mut surface, &poi, icon(), MarkerVisualState::default()).unwrap();
        let marker = layer.get(&poi.id).unwrap();

        assert!(marker.matches(&poi.clone().with_name("Dakh gorge")));
        assert!(!marker.matches(&Poi::new("dakh", LatLng::new(44.61, 40.10)).with_photo("https://x/1.jpg")));
        assert!(!marker.matches(&poi.clone().with_category(Category::Nature)));
    }

    #[test]
    fn test_visual_layer_never_takes_input() {
        let layer = VisualLayer::new();
        assert!(!layer.receives_input());
        assert!(layer.hit_test(&Point::new(0.0, 0.0)).is_none());
    }
}
