//! Core constants for the overlay engine.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Zoom range supported by the software surface.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 21.0;

/// Degrees are multiplied by this before rounding into cache keys (1e-7 deg ~ 1cm).
pub const COORD_QUANTUM: f64 = 1e7;

/// Native marker diameter in pixels.
pub const MARKER_DIAMETER: u32 = 56;

/// Selected native marker diameter in pixels.
pub const SELECTED_MARKER_DIAMETER: u32 = 72;

/// Hit targets are this much larger than the icon they cover.
pub const HIT_TARGET_SCALE: f64 = 1.1;

/// Z-index of the native (visual) marker layer.
pub const VISUAL_LAYER_Z_INDEX: i32 = 0;

/// Z-index of the interactive layer. Always the topmost layer.
pub const INTERACTIVE_LAYER_Z_INDEX: i32 = i32::MAX;

/// Markers projecting this far outside the screen are still reported by the software surface.
pub const OFFSCREEN_MARGIN: f64 = 64.0;
