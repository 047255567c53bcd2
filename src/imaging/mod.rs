//! Marker bitmaps: composition, caching and photo loading.

pub mod bitmap;
pub mod builder;
pub mod cache;
pub mod icon;
pub mod loader;

pub use bitmap::{DecodedPhoto, HardwarePixels};
pub use builder::{MarkerGeometry, MarkerImageBuilder};
pub use cache::IconCache;
pub use icon::{IconVariant, MarkerIcon};
pub use loader::{HttpPhotoLoader, PhotoLoader};
