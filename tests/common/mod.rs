#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use maplet_overlay::{
    imaging::bitmap::HardwarePixels, CameraPose, DecodedPhoto, DualLayerRenderer, LatLng, MapError,
    MapSurface, OverlayConfig, PhotoLoader, Point, SoftwareSurface,
};
use tokio::sync::Semaphore;

pub const MAYKOP: LatLng = LatLng {
    lat: 44.6098,
    lng: 40.1006,
};

pub fn phone_surface(zoom: f64) -> SoftwareSurface {
    SoftwareSurface::new(CameraPose::new(MAYKOP, zoom), Point::new(1080.0, 1920.0))
}

pub fn renderer_for(surface: &SoftwareSurface, loader: Arc<dyn PhotoLoader>) -> DualLayerRenderer {
    DualLayerRenderer::new(surface.id(), &OverlayConfig::default(), loader)
}

#[derive(Debug)]
pub struct FakeTexture {
    pub size: (u32, u32),
}

impl HardwarePixels for FakeTexture {
    fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    fn read_back(&self) -> maplet_overlay::Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([0, 200, 0, 255])))
    }
}

/// What the fake loader does for a URL
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Solid,
    Garbage,
    Hardware,
}

/// Photo loader serving canned photos, optionally held back by a gate
pub struct FakeLoader {
    behaviors: HashMap<String, Behavior>,
    gate: Option<Arc<Semaphore>>,
    pub fetches: AtomicUsize,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, url: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(url.to_string(), behavior);
        self
    }

    /// Every fetch waits until the returned semaphore gets permits
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhotoLoader for FakeLoader {
    async fn fetch(&self, url: &str) -> maplet_overlay::Result<DecodedPhoto> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| MapError::Cancelled)?;
        }
        match self.behaviors.get(url).copied().unwrap_or(Behavior::Solid) {
            Behavior::Solid => Ok(DecodedPhoto::Software(RgbaImage::from_pixel(
                40,
                30,
                Rgba([200, 30, 30, 255]),
            ))),
            Behavior::Garbage => DecodedPhoto::decode(b"definitely not a jpeg"),
            Behavior::Hardware => Ok(DecodedPhoto::Hardware(Arc::new(FakeTexture { size: (32, 32) }))),
        }
    }

    fn is_cached(&self, _url: &str) -> bool {
        false
    }
}

/// Runs `pump` until `done` holds or about a second has passed
pub async fn pump_until(
    renderer: &mut DualLayerRenderer,
    surface: &mut dyn MapSurface,
    mut done: impl FnMut(&DualLayerRenderer) -> bool,
) -> usize {
    let mut applied = 0;
    for _ in 0..200 {
        applied += renderer.pump(surface);
        if done(renderer) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    applied
}
