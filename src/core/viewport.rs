use crate::core::{
    camera::CameraPose,
    constants::TILE_SIZE,
    geo::{LatLng, LatLngBounds, Point, EARTH_RADIUS},
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Projection state of a map view: camera pose plus screen size.
///
/// Screen coordinates have their origin in the top-left corner. The camera
/// target always lands on the exact screen center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    camera: CameraPose,
    /// The size of the viewport in pixels
    pub size: Point,
    /// World pixel of the camera target, recomputed on every camera change
    pixel_origin: Point,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(camera: CameraPose, size: Point) -> Self {
        let mut viewport = Self {
            camera,
            size,
            pixel_origin: Point::default(),
        };
        viewport.update_pixel_origin();
        viewport
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    /// Replaces the camera pose
    pub fn set_camera(&mut self, camera: CameraPose) {
        self.camera = CameraPose {
            target: LatLng::new(LatLng::clamp_lat(camera.target.lat), camera.target.lng),
            ..camera
        };
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level
    /// (Web Mercator, EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.camera.zoom);
        let scale = TILE_SIZE * 2_f64.powf(z);

        let lat = LatLng::clamp_lat(lat_lng.lat);
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;

        let pixel_x = (x + PI * EARTH_RADIUS) / (2.0 * PI * EARTH_RADIUS) * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / (2.0 * PI * EARTH_RADIUS) * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.camera.zoom);
        let scale = TILE_SIZE * 2_f64.powf(z);

        let x = (pixel.x / scale) * (2.0 * PI * EARTH_RADIUS) - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * (2.0 * PI * EARTH_RADIUS);

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = self.project(&self.camera.target, None);
    }

    fn center_pixel(&self) -> Point {
        Point::new(self.size.x / 2.0, self.size.y / 2.0)
    }

    /// Converts a geographical coordinate to screen pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let offset = self.project(lat_lng, None).subtract(&self.pixel_origin);
        offset.rotate(-self.camera.azimuth).add(&self.center_pixel())
    }

    /// Converts screen pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let offset = pixel.subtract(&self.center_pixel()).rotate(self.camera.azimuth);
        self.unproject(&offset.add(&self.pixel_origin), None)
    }

    /// Gets the current viewport bounds in geographical coordinates.
    /// For a rotated camera this is the bounding box of the four screen corners.
    pub fn bounds(&self) -> LatLngBounds {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(self.size.x, 0.0),
            Point::new(0.0, self.size.y),
            Point::new(self.size.x, self.size.y),
        ]
        .map(|corner| self.pixel_to_lat_lng(&corner));

        let mut bounds = LatLngBounds::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            bounds.extend(corner);
        }
        bounds
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(CameraPose::default(), Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adygea_viewport(azimuth: f64) -> Viewport {
        let camera = CameraPose::new(LatLng::new(44.6098, 40.1006), 10.0).with_azimuth(azimuth);
        Viewport::new(camera, Point::new(1080.0, 1920.0))
    }

    #[test]
    fn test_target_projects_to_center() {
        let viewport = adygea_viewport(0.0);
        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(44.6098, 40.1006));

        assert!((pixel.x - 540.0).abs() < 1e-6);
        assert!((pixel.y - 960.0).abs() < 1e-6);
    }

    #[test]
    fn test_coordinate_round_trip() {
        for azimuth in [0.0, 37.0, 180.0] {
            let viewport = adygea_viewport(azimuth);
            let pixel = Point::new(100.0, 1500.0);
            let back = viewport.lat_lng_to_pixel(&viewport.pixel_to_lat_lng(&pixel));

            assert!(back.distance_to(&pixel) < 1e-6);
        }
    }

    #[test]
    fn test_north_is_up_without_rotation() {
        let viewport = adygea_viewport(0.0);
        let north = viewport.lat_lng_to_pixel(&LatLng::new(44.7, 40.1006));
        assert!(north.y < 960.0);
        assert!((north.x - 540.0).abs() < 1e-6);
    }

    #[test]
    fn test_east_is_up_when_facing_east() {
        let viewport = adygea_viewport(90.0);
        let east = viewport.lat_lng_to_pixel(&LatLng::new(44.6098, 40.2));
        assert!(east.y < 960.0);
        assert!((east.x - 540.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_contain_target() {
        let viewport = adygea_viewport(45.0);
        assert!(viewport.bounds().contains(&LatLng::new(44.6098, 40.1006)));
    }
}
