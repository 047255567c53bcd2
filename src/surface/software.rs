use fxhash::FxHashMap;

use crate::{
    core::{
        camera::CameraPose,
        constants::OFFSCREEN_MARGIN,
        geo::{LatLng, LatLngBounds, Point, ScreenRect},
        viewport::Viewport,
    },
    imaging::icon::MarkerIcon,
    surface::{MapSurface, PlacemarkId, SurfaceId},
    MapError, Result,
};

/// A native placemark held by the software surface
#[derive(Debug, Clone)]
pub struct Placemark {
    pub position: LatLng,
    pub icon: MarkerIcon,
    pub z_index: i32,
}

/// Counts of placemark mutations since creation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationStats {
    pub added: usize,
    pub removed: usize,
    pub icon_updates: usize,
}

impl MutationStats {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.icon_updates
    }
}

/// Headless map surface backed by a Web Mercator [`Viewport`].
///
/// Used for tests, snapshots and server-side rendering. Tilt is tracked as
/// part of the camera but the projection is always top-down.
#[derive(Debug)]
pub struct SoftwareSurface {
    id: SurfaceId,
    viewport: Viewport,
    ready: bool,
    offscreen_margin: f64,
    placemarks: FxHashMap<PlacemarkId, Placemark>,
    next_placemark: u64,
    stats: MutationStats,
}

impl SoftwareSurface {
    pub fn new(camera: CameraPose, size: Point) -> Self {
        Self {
            id: SurfaceId::next(),
            viewport: Viewport::new(camera, size),
            ready: true,
            offscreen_margin: OFFSCREEN_MARGIN,
            placemarks: FxHashMap::default(),
            next_placemark: 1,
            stats: MutationStats::default(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Moves the camera. The caller is expected to notify the overlay.
    pub fn move_to(&mut self, camera: CameraPose) {
        self.viewport.set_camera(camera);
    }

    pub fn resize(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    /// How far outside the screen a point may project and still be reported
    pub fn set_offscreen_margin(&mut self, margin: f64) {
        self.offscreen_margin = margin.max(0.0);
    }

    /// Destroys the surface: placemarks are gone and every call fails
    pub fn tear_down(&mut self) {
        self.ready = false;
        self.placemarks.clear();
    }

    pub fn placemarks(&self) -> impl Iterator<Item = (&PlacemarkId, &Placemark)> {
        self.placemarks.iter()
    }

    pub fn placemark(&self, id: PlacemarkId) -> Option<&Placemark> {
        self.placemarks.get(&id)
    }

    pub fn placemark_count(&self) -> usize {
        self.placemarks.len()
    }

    /// Where the surface draws a placemark, as its render loop sees it
    pub fn placemark_screen_position(&self, id: PlacemarkId) -> Option<Point> {
        let placemark = self.placemarks.get(&id)?;
        Some(self.viewport.lat_lng_to_pixel(&placemark.position))
    }

    pub fn mutation_stats(&self) -> MutationStats {
        self.stats
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(MapError::SurfaceUnavailable(format!("surface {:?} was torn down", self.id)))
        }
    }

    fn screen_rect(&self) -> ScreenRect {
        ScreenRect::new(Point::default(), self.viewport.size)
    }
}

impl MapSurface for SoftwareSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn camera(&self) -> Option<CameraPose> {
        self.ready.then(|| *self.viewport.camera())
    }

    fn screen_size(&self) -> Option<Point> {
        self.ready.then_some(self.viewport.size)
    }

    fn world_to_screen(&self, at: LatLng) -> Result<Option<Point>> {
        self.ensure_ready()?;
        if !at.is_valid() {
            return Err(MapError::Projection(format!("invalid coordinate {:?}", at)));
        }
        let pixel = self.viewport.lat_lng_to_pixel(&at);
        let on_screen = self.screen_rect().expand(self.offscreen_margin).contains(&pixel);
        Ok(on_screen.then_some(pixel))
    }

    fn screen_to_world(&self, point: Point) -> Result<Option<LatLng>> {
        self.ensure_ready()?;
        if !point.x.is_finite() || !point.y.is_finite() {
            return Ok(None);
        }
        Ok(Some(self.viewport.pixel_to_lat_lng(&point)))
    }

    fn visible_region(&self) -> Result<Option<LatLngBounds>> {
        self.ensure_ready()?;
        Ok(Some(self.viewport.bounds()))
    }

    fn add_placemark(&mut self, at: LatLng, icon: MarkerIcon, z_index: i32) -> Result<PlacemarkId> {
        self.ensure_ready()?;
        let id = PlacemarkId(self.next_placemark);
        self.next_placemark += 1;
        self.placemarks.insert(
            id,
            Placemark {
                position: at,
                icon,
                z_index,
            },
        );
        self.stats.added += 1;
        Ok(id)
    }

    fn set_placemark_icon(&mut self, id: PlacemarkId, icon: MarkerIcon) -> Result<()> {
        self.ensure_ready()?;
        let placemark = self
            .placemarks
            .get_mut(&id)
            .ok_or_else(|| MapError::Placemark(format!("unknown placemark {:?}", id)))?;
        placemark.icon = icon;
        self.stats.icon_updates += 1;
        Ok(())
    }

    fn remove_placemark(&mut self, id: PlacemarkId) -> Result<()> {
        self.ensure_ready()?;
        self.placemarks
            .remove(&id)
            .ok_or_else(|| MapError::Placemark(format!("unknown placemark {:?}", id)))?;
        self.stats.removed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_far_away_points_are_not_on_screen() {
        let surface = surface();
        assert!(surface.world_to_screen(LatLng::new(44.6098, 40.1006)).unwrap().is_some());
        assert!(surface.world_to_screen(LatLng::new(55.75, 37.61)).unwrap().is_none());
        assert!(surface.world_to_screen(LatLng::new(f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn test_placemark_crud_is_counted() {
        let mut surface = surface();
        let id = surface.add_placemark(LatLng::new(44.6, 40.1), icon(), 0).unwrap();
        surface.set_placemark_icon(id, icon()).unwrap();
        surface.remove_placemark(id).unwrap();

        assert!(surface.remove_placemark(id).is_err());
        assert_eq!(
            surface.mutation_stats(),
            MutationStats {
                added: 1,
                removed: 1,
                icon_updates: 1
            }
        );
    }

    #[test]
    fn test_torn_down_surface_refuses_everything() {
        let mut surface = surface();
        surface.add_placemark(LatLng::new(44.6, 40.1), icon(), 0).unwrap();
        surface.tear_down();

        assert!(!surface.is_ready());
        assert!(surface.camera().is_none());
        assert!(surface.camera_signature().is_none());
        assert_eq!(surface.placemark_count(), 0);
        assert!(surface.world_to_screen(LatLng::new(44.6, 40.1)).is_err());
        assert!(surface.add_placemark(LatLng::new(44.6, 40.1), icon(), 0).is_err());
    }

    #[test]
    fn test_screen_to_world_inverts_world_to_screen() {
        let surface = surface();
        let at = LatLng::new(44.62, 40.09);
        let pixel = surface.world_to_screen(at).unwrap().unwrap();
        let back = surface.screen_to_world(pixel).unwrap().unwrap();
        assert!((back.lat - at.lat).abs() < 1e-9);
        assert!((back.lng - at.lng).abs() < 1e-9);
    }
}
