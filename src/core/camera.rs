use std::hash::{Hash, Hasher};

use fxhash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::core::{
    constants::{MAX_ZOOM, MIN_ZOOM},
    geo::{LatLng, Point},
};

/// Camera state of a map surface: what it looks at and how
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Geographic point under the screen center
    pub target: LatLng,
    /// Zoom level (0 shows the whole world in one tile)
    pub zoom: f64,
    /// Rotation in degrees, clockwise from north
    #[serde(default)]
    pub azimuth: f64,
    /// Tilt in degrees away from the nadir
    #[serde(default)]
    pub tilt: f64,
}

impl CameraPose {
    pub fn new(target: LatLng, zoom: f64) -> Self {
        Self {
            target,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            azimuth: 0.0,
            tilt: 0.0,
        }
    }

    pub fn with_azimuth(mut self, azimuth: f64) -> Self {
        self.azimuth = azimuth.rem_euclid(360.0);
        self
    }

    pub fn with_tilt(mut self, tilt: f64) -> Self {
        self.tilt = tilt;
        self
    }

    /// Signature of this pose on a screen of the given size.
    ///
    /// Any change of target, zoom, azimuth, tilt or screen size yields a
    /// different signature; sub-centimeter jitter does not.
    pub fn signature(&self, screen: Point) -> CameraSignature {
        let mut hasher = FxHasher::default();
        self.target.cache_key().hash(&mut hasher);
        ((self.zoom * 1e4).round() as i64).hash(&mut hasher);
        ((self.azimuth * 1e3).round() as i64).hash(&mut hasher);
        ((self.tilt * 1e3).round() as i64).hash(&mut hasher);
        ((screen.x * 10.0).round() as i64).hash(&mut hasher);
        ((screen.y * 10.0).round() as i64).hash(&mut hasher);
        CameraSignature(hasher.finish())
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(LatLng::default(), 0.0)
    }
}

/// Hash of a camera pose and screen size, used to invalidate projection caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraSignature(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Point {
        Point::new(1080.0, 1920.0)
    }

    #[test]
    fn test_signature_is_stable() {
        let pose = CameraPose::new(LatLng::new(44.6098, 40.1006), 10.0);
        assert_eq!(pose.signature(screen()), pose.signature(screen()));
    }

    #[test]
    fn test_signature_changes_with_every_component() {
        let pose = CameraPose::new(LatLng::new(44.6098, 40.1006), 10.0);
        let base = pose.signature(screen());

        let moved = CameraPose::new(LatLng::new(44.6099, 40.1006), 10.0);
        assert_ne!(base, moved.signature(screen()));
        assert_ne!(base, CameraPose::new(pose.target, 10.5).signature(screen()));
        assert_ne!(base, pose.with_azimuth(15.0).signature(screen()));
        assert_ne!(base, pose.with_tilt(30.0).signature(screen()));
        assert_ne!(base, pose.signature(Point::new(1080.0, 1800.0)));
    }

    #[test]
    fn test_zoom_is_clamped_and_azimuth_wrapped() {
        let pose = CameraPose::new(LatLng::default(), 40.0).with_azimuth(-90.0);
        assert_eq!(pose.zoom, MAX_ZOOM);
        assert_eq!(pose.azimuth, 270.0);
    }
}
