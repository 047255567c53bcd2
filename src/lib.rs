//! # maplet-overlay
//!
//! Marker overlay engine for maplet-style map surfaces.
//!
//! Points of interest are drawn twice: once as native placemarks owned by the
//! map surface (pixel-locked to its render loop) and once as transparent hit
//! targets owned by the UI side, stacked on top so that every tap lands on
//! the overlay. Both layers are positioned from the same projection of the
//! current camera pose, so they never drift apart.

pub mod background;
pub mod core;
pub mod data;
pub mod imaging;
pub mod layers;
pub mod prelude;
pub mod projection;
pub mod registry;
pub mod runtime;
pub mod spatial;
pub mod surface;
pub mod traits;
#[cfg(feature = "egui")]
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    camera::{CameraPose, CameraSignature},
    config::{OverlayConfig, OverlayProfile},
    geo::{LatLng, LatLngBounds, Point, ScreenRect},
    viewport::Viewport,
};

pub use data::poi::{Category, Poi, PoiId};

pub use imaging::{
    bitmap::DecodedPhoto,
    builder::MarkerImageBuilder,
    icon::{IconVariant, MarkerIcon},
    loader::{HttpPhotoLoader, PhotoLoader},
};

pub use layers::{
    base::MarkerTap,
    renderer::{DualLayerRenderer, OverlayFrame},
};

pub use projection::converter::CoordinateConverter;

pub use registry::OverlayRegistry;

pub use surface::{software::SoftwareSurface, MapSurface, PlacemarkId, SurfaceId};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Map surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Placemark error: {0}")]
    Placemark(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Photo load cancelled")]
    Cancelled,
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
