//! Circular marker bitmaps.
//!
//! Every marker is drawn in three passes: a blurred drop shadow, a border
//! ring, then (if available) the photo clipped to the inside of the ring.
//! Without a photo the interior stays fully transparent; there is no colored
//! or symbol fill.

use image::{imageops, Rgba, RgbaImage};

use crate::{
    core::config::MarkerStyleConfig,
    data::poi::Category,
    imaging::icon::{IconVariant, MarkerIcon},
    MapError, Result,
};

/// Pixel layout of one marker variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerGeometry {
    /// Side of the square canvas, including room for the shadow
    pub canvas: u32,
    /// Canvas center, in pixels
    pub center: f32,
    /// Outer radius of the border ring
    pub radius: f32,
    pub border_width: f32,
}

impl MarkerGeometry {
    /// Radius of the area inside the border, where the photo goes
    pub fn inner_radius(&self) -> f32 {
        (self.radius - self.border_width).max(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct MarkerImageBuilder {
    style: MarkerStyleConfig,
}

impl MarkerImageBuilder {
    pub fn new(style: MarkerStyleConfig) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &MarkerStyleConfig {
        &self.style
    }

    pub fn geometry(&self, variant: IconVariant) -> MarkerGeometry {
        let (diameter, border_width) = match variant {
            IconVariant::Regular => (self.style.diameter, self.style.border_width),
            IconVariant::Selected => (self.style.selected_diameter, self.style.selected_border_width),
        };
        let (dx, dy) = self.style.shadow_offset;
        let margin = (self.style.shadow_blur * 3.0 + dx.abs().max(dy.abs())).ceil() as u32 + 1;
        let canvas = diameter + 2 * margin;

        MarkerGeometry {
            canvas,
            center: canvas as f32 / 2.0,
            radius: diameter as f32 / 2.0,
            border_width,
        }
    }

    /// Shadow and border only, transparent inside
    pub fn shell(&self, category: Category, variant: IconVariant) -> MarkerIcon {
        let geometry = self.geometry(variant);
        let mut canvas = self.draw_shadow(&geometry);
        self.draw_border(&mut canvas, &geometry, self.border_color(category, variant));
        MarkerIcon::new(canvas, false)
    }

    /// Shadow, border and the photo center-cropped into the circle
    pub fn with_photo(
        &self,
        photo: &RgbaImage,
        category: Category,
        variant: IconVariant,
    ) -> Result<MarkerIcon> {
        let geometry = self.geometry(variant);
        let mut canvas = self.draw_shadow(&geometry);
        self.draw_border(&mut canvas, &geometry, self.border_color(category, variant));
        draw_photo(&mut canvas, photo, &geometry)?;
        Ok(MarkerIcon::new(canvas, true))
    }

    fn border_color(&self, category: Category, variant: IconVariant) -> [u8; 4] {
        match variant {
            IconVariant::Selected if self.style.tint_selected_border => category.style().color,
            _ => self.style.border_color,
        }
    }

    fn draw_shadow(&self, geometry: &MarkerGeometry) -> RgbaImage {
        let (dx, dy) = self.style.shadow_offset;
        let shadow_center = (geometry.center + dx, geometry.center + dy);
        let alpha = self.style.shadow_alpha as f32;

        let mut shadow = RgbaImage::new(geometry.canvas, geometry.canvas);
        for (x, y, pixel) in shadow.enumerate_pixels_mut() {
            let coverage = disc_coverage(distance(x, y, shadow_center), geometry.radius);
            if coverage > 0.0 {
                *pixel = Rgba([0, 0, 0, (alpha * coverage).round() as u8]);
            }
        }

        let mut shadow = if self.style.shadow_blur > 0.0 {
            imageops::blur(&shadow, self.style.shadow_blur)
        } else {
            shadow
        };

        // Nothing may show through the interior of an empty marker.
        let center = (geometry.center, geometry.center);
        let inner = geometry.inner_radius();
        for (x, y, pixel) in shadow.enumerate_pixels_mut() {
            let keep = 1.0 - disc_coverage(distance(x, y, center), inner);
            pixel[3] = (pixel[3] as f32 * keep).round() as u8;
        }
        shadow
    }

    fn draw_border(&self, canvas: &mut RgbaImage, geometry: &MarkerGeometry, color: [u8; 4]) {
        if geometry.border_width <= 0.0 {
            return;
        }
        let center = (geometry.center, geometry.center);
        let inner = geometry.inner_radius();
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let d = distance(x, y, center);
            let coverage = disc_coverage(d, geometry.radius) * (1.0 - disc_coverage(d, inner));
            blend(pixel, color, coverage);
        }
    }
}

fn draw_photo(canvas: &mut RgbaImage, photo: &RgbaImage, geometry: &MarkerGeometry) -> Result<()> {
    let (width, height) = photo.dimensions();
    if width == 0 || height == 0 {
        return Err(MapError::Image("photo has no pixels".into()));
    }
    let inner = geometry.inner_radius();
    let target = (inner * 2.0).ceil() as u32 + 1;
    if inner <= 0.0 {
        return Err(MapError::Image("marker has no room for a photo".into()));
    }

    let side = width.min(height);
    let cropped = imageops::crop_imm(photo, (width - side) / 2, (height - side) / 2, side, side).to_image();
    let scaled = imageops::resize(&cropped, target, target, imageops::FilterType::Triangle);

    let origin = geometry.center - target as f32 / 2.0;
    let center = (geometry.center, geometry.center);
    let max_index = (target - 1) as f32;
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        // Half a pixel of overlap with the ring avoids a seam.
        let coverage = disc_coverage(distance(x, y, center), inner + 0.5);
        if coverage <= 0.0 {
            continue;
        }
        let sx = (x as f32 + 0.5 - origin).floor().clamp(0.0, max_index) as u32;
        let sy = (y as f32 + 0.5 - origin).floor().clamp(0.0, max_index) as u32;
        blend(pixel, scaled.get_pixel(sx, sy).0, coverage);
    }
    Ok(())
}

fn distance(x: u32, y: u32, center: (f32, f32)) -> f32 {
    let dx = x as f32 + 0.5 - center.0;
    let dy = y as f32 + 0.5 - center.1;
    (dx * dx + dy * dy).sqrt()
}

/// Anti-aliased coverage of a pixel at `distance` from the center of a disc
fn disc_coverage(distance: f32, radius: f32) -> f32 {
    (radius + 0.5 - distance).clamp(0.0, 1.0)
}

/// Source-over compositing with straight alpha
fn blend(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f32) {
    let src_alpha = src[3] as f32 / 255.0 * coverage;
    if src_alpha <= 0.0 {
        return;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    for channel in 0..3 {
        let value = (src[channel] as f32 * src_alpha
            + dst[channel] as f32 * dst_alpha * (1.0 - src_alpha))
            / out_alpha;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MarkerImageBuilder {
        MarkerImageBuilder::new(MarkerStyleConfig::default())
    }

    fn ring_pixel(geometry: &MarkerGeometry) -> (u32, u32) {
        let x = geometry.center + geometry.radius - geometry.border_width / 2.0;
        (x.floor() as u32, geometry.center.floor() as u32)
    }

    #[test]
    fn test_selected_markers_are_larger() {
        let b = builder();
        let regular = b.geometry(IconVariant::Regular);
        let selected = b.geometry(IconVariant::Selected);
        assert!(selected.canvas > regular.canvas);
        assert!(selected.border_width > regular.border_width);
    }

    #[test]
    fn test_shell_has_transparent_interior_and_opaque_ring() {
        let b = builder();
        let geometry = b.geometry(IconVariant::Regular);
        let icon = b.shell(Category::Nature, IconVariant::Regular);
        let c = geometry.center as u32;

        assert!(!icon.has_photo());
        assert_eq!(icon.width(), geometry.canvas);
        assert_eq!(icon.image().get_pixel(c, c)[3], 0);
        assert_eq!(icon.image().get_pixel(c + 5, c - 7)[3], 0);

        let (rx, ry) = ring_pixel(&geometry);
        assert_eq!(icon.image().get_pixel(rx, ry), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_shadow_falls_below_the_ring() {
        let b = builder();
        let geometry = b.geometry(IconVariant::Regular);
        let icon = b.shell(Category::Other, IconVariant::Regular);
        let c = geometry.center as u32;
        let just_below = (geometry.center + geometry.radius + 1.0) as u32;

        let pixel = icon.image().get_pixel(c, just_below);
        assert!(pixel[3] > 0, "expected shadow below the marker");
        assert_eq!(pixel[0], 0);
        assert_eq!(icon.image().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_selected_border_takes_category_color() {
        let b = builder();
        let geometry = b.geometry(IconVariant::Selected);
        let icon = b.shell(Category::Gastronomy, IconVariant::Selected);
        let (rx, ry) = ring_pixel(&geometry);

        assert_eq!(icon.image().get_pixel(rx, ry).0, Category::Gastronomy.style().color);
    }

    #[test]
    fn test_photo_fills_the_circle() {
        let b = builder();
        let geometry = b.geometry(IconVariant::Regular);
        // Wide photo: left half red, right half blue; center crop keeps both halves.
        let photo = RgbaImage::from_fn(300, 100, |x, _| {
            if x < 150 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let icon = b.with_photo(&photo, Category::Nature, IconVariant::Regular).unwrap();
        let c = geometry.center as u32;
        let inner = geometry.inner_radius() as u32;

        assert!(icon.has_photo());
        assert_eq!(icon.image().get_pixel(c - inner / 2, c), &Rgba([255, 0, 0, 255]));
        assert_eq!(icon.image().get_pixel(c + inner / 2, c), &Rgba([0, 0, 255, 255]));

        let (rx, ry) = ring_pixel(&geometry);
        assert_eq!(icon.image().get_pixel(rx, ry), &Rgba([255, 255, 255, 255]));
        assert_eq!(icon.image().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_empty_photo_is_an_error() {
        let b = builder();
        assert!(b
            .with_photo(&RgbaImage::new(0, 10), Category::Other, IconVariant::Regular)
            .is_err());
    }

    #[test]
    fn test_blend_over_transparent_keeps_source() {
        let mut pixel = Rgba([0, 0, 0, 0]);
        blend(&mut pixel, [10, 20, 30, 255], 1.0);
        assert_eq!(pixel, Rgba([10, 20, 30, 255]));

        let mut pixel = Rgba([0, 0, 0, 0]);
        blend(&mut pixel, [10, 20, 30, 255], 0.0);
        assert_eq!(pixel, Rgba([0, 0, 0, 0]));
    }
}
