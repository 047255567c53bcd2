pub mod overlay;

pub use overlay::{to_egui_rect, to_map_point, OverlayWidget};

use crate::layers::{
    base::MarkerTap,
    renderer::{DualLayerRenderer, OverlayFrame},
};

pub trait OverlayContextExt {
    /// Shows the marker hit layer over `map_rect`
    fn marker_overlay(
        &self,
        renderer: &DualLayerRenderer,
        frame: &OverlayFrame,
        map_rect: egui::Rect,
    ) -> Option<MarkerTap>;
}

impl OverlayContextExt for egui::Context {
    fn marker_overlay(
        &self,
        renderer: &DualLayerRenderer,
        frame: &OverlayFrame,
        map_rect: egui::Rect,
    ) -> Option<MarkerTap> {
        OverlayWidget::new(renderer, frame).show(self, map_rect)
    }
}
