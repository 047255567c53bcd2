//! Two-layer marker rendering for one map surface.
//!
//! The visual layer keeps the surface's native placemarks in sync with the
//! POI list and the photo pipeline; the interactive layer places transparent
//! hit targets over them from the same positions. Taps only ever reach the
//! application through [`DualLayerRenderer::handle_tap`].

use std::cmp::Reverse;
use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};

use crate::{
    background::loads::{LoadRequest, PhotoLoadQueue},
    core::{
        camera::CameraSignature,
        config::OverlayConfig,
        geo::{Point, ScreenRect},
    },
    data::poi::{Category, Poi, PoiId},
    imaging::{
        builder::MarkerImageBuilder,
        cache::IconCache,
        icon::{IconVariant, MarkerIcon},
        loader::PhotoLoader,
    },
    layers::{
        base::{MarkerTap, OverlayLayer},
        interactive::InteractiveLayer,
        positioner::OverlayPositioner,
        visual::{ImageState, MarkerVisualState, NativeMarker, SyncReport, VisualLayer},
    },
    projection::converter::CoordinateConverter,
    surface::{MapSurface, PlacemarkId, SurfaceId},
    traits::{CacheStats, Cacheable},
    MapError, Result,
};

/// One marker as laid out in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFrameEntry {
    pub poi: PoiId,
    pub placemark: Option<PlacemarkId>,
    /// Center of the hit target
    pub interactive: Point,
    /// Where the surface draws the placemark, if there is one
    pub visual: Option<Point>,
    pub hit_rect: ScreenRect,
    pub state: MarkerVisualState,
}

impl MarkerFrameEntry {
    /// Distance between the two layers' positions for this marker
    pub fn layer_offset(&self) -> Option<f64> {
        self.visual.map(|visual| visual.distance_to(&self.interactive))
    }
}

/// Layout of the overlay for one camera version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub camera_version: u64,
    /// Hit targets in draw order, bottom first
    pub entries: Vec<MarkerFrameEntry>,
    /// Tracked POIs not shown because they do not project on screen
    pub dropped: usize,
}

impl OverlayFrame {
    pub fn entry(&self, poi: &PoiId) -> Option<&MarkerFrameEntry> {
        self.entries.iter().find(|entry| &entry.poi == poi)
    }

    /// Largest distance between the layers over every marker
    pub fn max_layer_offset(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(MarkerFrameEntry::layer_offset)
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct DualLayerRenderer {
    surface_id: SurfaceId,
    config: OverlayConfig,
    builder: Arc<MarkerImageBuilder>,
    converter: CoordinateConverter,
    positioner: OverlayPositioner,
    visual: VisualLayer,
    interactive: InteractiveLayer,
    icons: IconCache,
    shells: FxHashMap<(Category, IconVariant), MarkerIcon>,
    loads: PhotoLoadQueue,
    selected: Option<PoiId>,
    last_signature: Option<CameraSignature>,
    disposed: bool,
}

impl DualLayerRenderer {
    pub fn new(surface_id: SurfaceId, config: &OverlayConfig, loader: Arc<dyn PhotoLoader>) -> Self {
        let builder = Arc::new(MarkerImageBuilder::new(config.marker.clone()));
        let loads = PhotoLoadQueue::new(loader, builder.clone(), config.loader.max_concurrent);
        Self {
            surface_id,
            config: config.clone(),
            builder,
            converter: CoordinateConverter::new(config.cache.position_capacity),
            positioner: OverlayPositioner::new(),
            visual: VisualLayer::new(),
            interactive: InteractiveLayer::new(),
            icons: IconCache::new(config.cache.icon_capacity),
            shells: FxHashMap::default(),
            loads,
            selected: None,
            last_signature: None,
            disposed: false,
        }
    }

    /// Reconciles the placemarks with `pois`, touching only what changed.
    ///
    /// Duplicate ids keep their first occurrence. Fails without changing
    /// anything if `surface` is not this renderer's surface or not ready.
    pub fn set_pois(&mut self, surface: &mut dyn MapSurface, pois: &[Poi]) -> Result<SyncReport> {
        if self.disposed {
            return Ok(SyncReport::default());
        }
        self.check_surface(&*surface)?;

        let mut seen = FxHashSet::default();
        let mut unique = Vec::with_capacity(pois.len());
        for poi in pois {
            if seen.insert(poi.id.clone()) {
                unique.push(poi.clone());
            } else {
                log::debug!("duplicate POI id {}, keeping the first", poi.id);
            }
        }

        let mut report = SyncReport::default();
        for id in self.visual.ids() {
            if seen.contains(&id) {
                continue;
            }
            self.loads.cancel(&id);
            match self.visual.remove(surface, &id) {
                Ok(_) => report.removed += 1,
                Err(e) => {
                    log::warn!("cannot remove placemark of {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }
        if self.selected.as_ref().is_some_and(|id| !seen.contains(id)) {
            self.selected = None;
        }

        for poi in &unique {
            let existing = self.visual.get(&poi.id).map(|marker| {
                let restyled = marker.category != poi.category || marker.photo.as_deref() != poi.first_photo();
                (marker.matches(poi), restyled)
            });
            match existing {
                Some((true, _)) => report.unchanged += 1,
                Some((false, restyled)) => {
                    self.loads.cancel(&poi.id);
                    if restyled {
                        self.icons.remove_poi(&poi.id);
                    }
                    if let Err(e) = self.visual.remove(surface, &poi.id) {
                        log::warn!("cannot remove placemark of {}: {}", poi.id, e);
                    }
                    match self.add_marker(surface, poi) {
                        Ok(()) => report.moved += 1,
                        Err(e) => {
                            log::warn!("cannot re-create placemark of {}: {}", poi.id, e);
                            report.failed += 1;
                        }
                    }
                }
                None => match self.add_marker(surface, poi) {
                    Ok(()) => report.added += 1,
                    Err(e) => {
                        log::warn!("cannot create placemark of {}: {}", poi.id, e);
                        report.failed += 1;
                    }
                },
            }
        }

        // POIs the surface refused get no hit target; the next sync retries them.
        unique.retain(|poi| self.visual.contains(&poi.id));
        self.positioner.set_pois(unique);
        log::debug!("marker sync on {:?}: {:?}", self.surface_id, report);
        Ok(report)
    }

    /// Moves the selection. Only the previously and newly selected markers
    /// change icon.
    pub fn set_selected(&mut self, surface: &mut dyn MapSurface, selected: Option<PoiId>) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.check_surface(&*surface)?;
        if self.selected == selected {
            return Ok(());
        }

        let previous = std::mem::replace(&mut self.selected, selected.clone());
        let mut first_error = None;
        for (id, is_selected) in [(previous, false), (selected, true)] {
            let Some(id) = id else { continue };
            if let Err(e) = self.restyle(surface, &id, is_selected) {
                log::warn!("cannot restyle marker {}: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Records a camera move; returns the new camera version
    pub fn on_camera_changed(&mut self) -> u64 {
        if self.disposed {
            return self.positioner.camera_version();
        }
        self.positioner.on_camera_changed()
    }

    /// Lays out both layers for the current camera
    pub fn frame(&mut self, surface: &dyn MapSurface) -> OverlayFrame {
        let mut frame = OverlayFrame {
            camera_version: self.positioner.camera_version(),
            ..OverlayFrame::default()
        };
        if self.disposed || self.check_surface(surface).is_err() {
            return frame;
        }

        // Resizes and missed notifications still count as camera changes.
        let signature = surface.camera_signature();
        if signature != self.last_signature {
            self.last_signature = signature;
            self.positioner.on_camera_changed();
        }
        frame.camera_version = self.positioner.camera_version();

        let tracked = self.positioner.tracked().len();
        let positions = self.positioner.positions(surface, &mut self.converter);
        frame.dropped = tracked - positions.len();

        let scale = self.config.hit_target.scale;
        let regular = self.config.marker.diameter as f64 * scale;
        let enlarged = self.config.marker.selected_diameter as f64 * scale;
        let selected = self.selected.as_ref();
        self.interactive.rebuild(positions, selected, |position| {
            if selected == Some(&position.poi) {
                enlarged
            } else {
                regular
            }
        });

        frame.entries = self
            .interactive
            .targets()
            .iter()
            .map(|target| {
                let marker = self.visual.get(&target.poi);
                let visual = marker.and_then(|marker| surface.world_to_screen(marker.position).ok().flatten());
                MarkerFrameEntry {
                    poi: target.poi.clone(),
                    placemark: marker.map(|marker| marker.placemark),
                    interactive: target.center,
                    visual,
                    hit_rect: target.rect,
                    state: marker.map(|marker| marker.state).unwrap_or_default(),
                }
            })
            .collect();
        frame
    }

    /// Resolves a tap against the layout of the last frame
    pub fn handle_tap(&self, point: Point) -> Option<MarkerTap> {
        if self.disposed {
            return None;
        }
        let mut layers: [&dyn OverlayLayer; 2] = [&self.visual, &self.interactive];
        layers.sort_by_key(|layer| Reverse(layer.z_index()));

        let tap = layers
            .iter()
            .filter(|layer| layer.receives_input())
            .find_map(|layer| layer.hit_test(&point));
        if let Some(tap) = &tap {
            log::debug!("tap at ({:.1}, {:.1}) hit {}", point.x, point.y, tap.poi);
        }
        tap
    }

    /// Applies finished photo loads. Returns how many placemarks changed.
    pub fn pump(&mut self, surface: &mut dyn MapSurface) -> usize {
        if self.disposed || self.check_surface(&*surface).is_err() {
            return 0;
        }

        let mut applied = 0;
        for outcome in self.loads.drain_ready() {
            let current = self
                .visual
                .get(&outcome.poi)
                .map(|marker| marker.state)
                .filter(|state| state.variant() == outcome.variant);

            match outcome.icon {
                Ok(icon) => {
                    self.icons.put(outcome.poi.clone(), outcome.variant, icon.clone());
                    let Some(state) = current else { continue };
                    let loaded = MarkerVisualState {
                        image: ImageState::Loaded,
                        ..state
                    };
                    match self.visual.set_icon(surface, &outcome.poi, icon, loaded) {
                        Ok(_) => applied += 1,
                        Err(e) => log::warn!("cannot apply photo to {}: {}", outcome.poi, e),
                    }
                }
                Err(e) => {
                    log::warn!("photo for {} failed, keeping the shell: {}", outcome.poi, e);
                    if let Some(state) = current {
                        let failed = MarkerVisualState {
                            image: ImageState::Failed,
                            ..state
                        };
                        self.visual.set_state(&outcome.poi, failed);
                    }
                }
            }
        }
        applied
    }

    /// Removes every placemark and cancels every load. Afterwards the
    /// renderer never touches a surface again.
    pub fn dispose(&mut self, surface: &mut dyn MapSurface) {
        if self.disposed {
            return;
        }
        self.loads.close();
        if surface.id() == self.surface_id && surface.is_ready() {
            let removed = self.visual.clear(surface);
            log::debug!("removed {} placemarks from {:?}", removed, self.surface_id);
        } else {
            self.visual.forget_all();
        }
        self.finish_dispose();
    }

    /// Disposal for a surface that no longer exists
    pub fn dispose_detached(&mut self) {
        if self.disposed {
            return;
        }
        self.loads.close();
        self.visual.forget_all();
        self.finish_dispose();
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn selected(&self) -> Option<&PoiId> {
        self.selected.as_ref()
    }

    pub fn camera_version(&self) -> u64 {
        self.positioner.camera_version()
    }

    pub fn marker(&self, poi: &PoiId) -> Option<&NativeMarker> {
        self.visual.get(poi)
    }

    pub fn marker_count(&self) -> usize {
        self.visual.len()
    }

    pub fn tracked(&self) -> &[Poi] {
        self.positioner.tracked()
    }

    pub fn pending_loads(&self) -> usize {
        self.loads.in_flight_len()
    }

    pub fn interactive_layer(&self) -> &InteractiveLayer {
        &self.interactive
    }

    pub fn builder(&self) -> &MarkerImageBuilder {
        &self.builder
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn icon_cache_stats(&self) -> CacheStats {
        self.icons.cache_stats()
    }

    pub fn position_cache_stats(&self) -> CacheStats {
        self.converter.cache_stats()
    }

    fn check_surface(&self, surface: &dyn MapSurface) -> Result<()> {
        if surface.id() != self.surface_id {
            return Err(MapError::SurfaceUnavailable(format!(
                "overlay of {:?} was handed {:?}",
                self.surface_id,
                surface.id()
            )));
        }
        if !surface.is_ready() {
            return Err(MapError::SurfaceUnavailable(format!("{:?} is not ready", self.surface_id)));
        }
        Ok(())
    }

    fn add_marker(&mut self, surface: &mut dyn MapSurface, poi: &Poi) -> Result<()> {
        let selected = self.selected.as_ref() == Some(&poi.id);
        let (icon, image) = self.icon_for(&poi.id, poi.category, poi.first_photo(), IconVariant::from(selected));
        self.visual.insert(surface, poi, icon, MarkerVisualState { selected, image })?;
        Ok(())
    }

    fn restyle(&mut self, surface: &mut dyn MapSurface, poi: &PoiId, selected: bool) -> Result<()> {
        let Some(marker) = self.visual.get(poi) else {
            return Ok(());
        };
        let (category, photo) = (marker.category, marker.photo.clone());
        let (icon, image) = self.icon_for(poi, category, photo.as_deref(), IconVariant::from(selected));
        self.visual.set_icon(surface, poi, icon, MarkerVisualState { selected, image })?;
        Ok(())
    }

    /// Best icon available right now; starts a load when the photo is missing
    fn icon_for(
        &mut self,
        poi: &PoiId,
        category: Category,
        photo: Option<&str>,
        variant: IconVariant,
    ) -> (MarkerIcon, ImageState) {
        let Some(url) = photo else {
            return (self.shell(category, variant), ImageState::NoPhoto);
        };
        if let Some(icon) = self.icons.get(poi, variant) {
            return (icon, ImageState::Loaded);
        }
        self.loads.enqueue(LoadRequest {
            poi: poi.clone(),
            url: url.to_string(),
            category,
            variant,
        });
        (self.shell(category, variant), ImageState::Pending)
    }

    fn shell(&mut self, category: Category, variant: IconVariant) -> MarkerIcon {
        let builder = &self.builder;
        self.shells
            .entry((category, variant))
            .or_insert_with(|| builder.shell(category, variant))
            .clone()
    }

    fn finish_dispose(&mut self) {
        self.interactive.clear();
        self.positioner.dispose();
        self.converter.clear_cache();
        self.icons.clear_cache();
        self.shells.clear();
        self.selected = None;
        self.disposed = true;
        log::info!("overlay for {:?} disposed", self.surface_id);
    }
}

impl std::fmt::Debug for DualLayerRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualLayerRenderer")
            .field("surface_id", &self.surface_id)
            .field("markers", &self.visual.len())
            .field("selected", &self.selected)
            .field("loads", &self.loads)
            .field("disposed", &self.disposed)
            .finish()
    }
}
