//! The interactive layer as an egui widget.
//!
//! Every hit target is its own small foreground area, so it sits above the
//! map and takes taps inside its rect while pans and taps elsewhere still
//! reach the map underneath. Taps are resolved by the renderer's hit test,
//! which settles overlaps between neighbouring targets.

use egui::{Color32, Context, CursorIcon, Id, Order, Pos2, Rect, Sense, Stroke};

use crate::{
    core::geo::{Point, ScreenRect},
    layers::{
        base::MarkerTap,
        renderer::{DualLayerRenderer, OverlayFrame},
    },
};

pub struct OverlayWidget<'a> {
    renderer: &'a DualLayerRenderer,
    frame: &'a OverlayFrame,
    outline: Option<Stroke>,
}

impl<'a> OverlayWidget<'a> {
    pub fn new(renderer: &'a DualLayerRenderer, frame: &'a OverlayFrame) -> Self {
        Self {
            renderer,
            frame,
            outline: None,
        }
    }

    /// Strokes every hit target, for checking alignment by eye
    pub fn debug_outlines(mut self, enabled: bool) -> Self {
        self.outline = enabled.then(|| Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 64, 64, 160)));
        self
    }

    /// Shows the hit targets over `map_rect` and returns the marker tapped this frame
    pub fn show(self, ctx: &Context, map_rect: Rect) -> Option<MarkerTap> {
        let base = Id::new(("maplet-overlay", self.renderer.surface_id().0));
        let mut tapped = None;

        for entry in &self.frame.entries {
            let rect = to_egui_rect(&entry.hit_rect, map_rect).intersect(map_rect);
            if !rect.is_positive() {
                continue;
            }
            let response = egui::Area::new(base.with(&entry.poi))
                .order(Order::Foreground)
                .fixed_pos(rect.min)
                .movable(false)
                .constrain(false)
                .show(ctx, |ui| {
                    if let Some(stroke) = self.outline {
                        ui.painter().rect_stroke(rect, 0.0, stroke);
                    }
                    ui.allocate_rect(rect, Sense::click())
                        .on_hover_cursor(CursorIcon::PointingHand)
                })
                .inner;

            if tapped.is_none() && response.clicked() {
                tapped = response
                    .interact_pointer_pos()
                    .and_then(|pos| self.renderer.handle_tap(to_map_point(pos, map_rect)));
            }
        }
        tapped
    }
}

/// Screen position relative to the map's top-left corner
pub fn to_map_point(pos: Pos2, map_rect: Rect) -> Point {
    let local = pos - map_rect.min;
    Point::new(local.x as f64, local.y as f64)
}

/// A map-relative rectangle in egui screen coordinates
pub fn to_egui_rect(rect: &ScreenRect, map_rect: Rect) -> Rect {
    Rect::from_min_max(
        map_rect.min + egui::vec2(rect.min.x as f32, rect.min.y as f32),
        map_rect.min + egui::vec2(rect.max.x as f32, rect.max.y as f32),
    )
}
