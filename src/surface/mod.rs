//! The map surface: whatever actually draws the map.
//!
//! A surface owns the camera and the native placemarks. The overlay never
//! owns a surface; it borrows one for the duration of each call, so a torn
//! down surface can never be reached through a stale handle.

pub mod software;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    core::{
        camera::{CameraPose, CameraSignature},
        geo::{LatLng, LatLngBounds, Point},
    },
    imaging::icon::MarkerIcon,
    Result,
};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a live map surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocates a process-unique id
    pub fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a native placemark on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacemarkId(pub u64);

/// Projection and placemark operations offered by a map engine.
///
/// Every method is called from the main context only. Projection methods may
/// fail; callers treat failures as "nothing to show".
pub trait MapSurface {
    fn id(&self) -> SurfaceId;

    /// False before the first layout and after teardown
    fn is_ready(&self) -> bool;

    fn camera(&self) -> Option<CameraPose>;

    fn screen_size(&self) -> Option<Point>;

    /// Screen position of a geographic point, `None` when it is not on screen
    fn world_to_screen(&self, at: LatLng) -> Result<Option<Point>>;

    fn screen_to_world(&self, point: Point) -> Result<Option<LatLng>>;

    fn visible_region(&self) -> Result<Option<LatLngBounds>>;

    fn add_placemark(&mut self, at: LatLng, icon: MarkerIcon, z_index: i32) -> Result<PlacemarkId>;

    fn set_placemark_icon(&mut self, id: PlacemarkId, icon: MarkerIcon) -> Result<()>;

    fn remove_placemark(&mut self, id: PlacemarkId) -> Result<()>;

    /// Signature of the current camera pose and screen size
    fn camera_signature(&self) -> Option<CameraSignature> {
        Some(self.camera()?.signature(self.screen_size()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_ids_are_unique() {
        let a = SurfaceId::next();
        let b = SurfaceId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
