//! Prelude module for common overlay types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_overlay::prelude::*;`

pub use crate::core::{
    camera::{CameraPose, CameraSignature},
    config::{CacheConfig, HitTargetConfig, LoaderConfig, MarkerStyleConfig, OverlayConfig, OverlayProfile},
    geo::{LatLng, LatLngBounds, Point, ScreenRect},
    viewport::Viewport,
};

pub use crate::data::poi::{pois_from_json, Category, CategoryStyle, Poi, PoiId};

pub use crate::imaging::{
    bitmap::{DecodedPhoto, HardwarePixels},
    builder::MarkerImageBuilder,
    cache::IconCache,
    icon::{IconVariant, MarkerIcon},
    loader::{HttpPhotoLoader, PhotoLoader},
};

pub use crate::layers::{
    base::{LayerKind, MarkerTap, OverlayLayer},
    positioner::{MarkerPosition, OverlayPositioner},
    renderer::{DualLayerRenderer, MarkerFrameEntry, OverlayFrame},
    visual::{ImageState, MarkerVisualState, SyncReport},
};

pub use crate::projection::converter::CoordinateConverter;

pub use crate::registry::OverlayRegistry;

pub use crate::surface::{software::SoftwareSurface, MapSurface, PlacemarkId, SurfaceId};

pub use crate::background::loads::PhotoLoadQueue;

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{CacheStats, Cacheable};

#[cfg(feature = "egui")]
pub use crate::ui::{OverlayContextExt, OverlayWidget};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};
