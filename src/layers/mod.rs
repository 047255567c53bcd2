//! The two overlay layers and the renderer that keeps them in step.

pub mod base;
pub mod interactive;
pub mod macros;
pub mod positioner;
pub mod renderer;
pub mod visual;

pub use base::{LayerKind, LayerProperties, MarkerTap, OverlayLayer};
pub use interactive::{HitTarget, InteractiveLayer};
pub use positioner::{MarkerPosition, OverlayPositioner};
pub use renderer::{DualLayerRenderer, MarkerFrameEntry, OverlayFrame};
pub use visual::{ImageState, MarkerVisualState, NativeMarker, SyncReport, VisualLayer};
