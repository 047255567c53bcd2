//! Which overlay belongs to which map surface.
//!
//! There is exactly one renderer per surface. The registry owns them and is
//! the only place they are created and torn down.

use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{
    core::config::OverlayConfig,
    imaging::loader::{HttpPhotoLoader, PhotoLoader},
    layers::renderer::DualLayerRenderer,
    surface::{MapSurface, SurfaceId},
    Result,
};

pub struct OverlayRegistry {
    config: OverlayConfig,
    loader: Arc<dyn PhotoLoader>,
    renderers: FxHashMap<SurfaceId, DualLayerRenderer>,
}

impl OverlayRegistry {
    /// Validates `config` and shares `loader` between every renderer
    pub fn new(config: OverlayConfig, loader: Arc<dyn PhotoLoader>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            renderers: FxHashMap::default(),
        })
    }

    /// Registry using the stock HTTP photo loader
    pub fn with_http_loader(config: OverlayConfig) -> Result<Self> {
        let loader = HttpPhotoLoader::new(&config.loader, &config.cache)?;
        Self::new(config, Arc::new(loader))
    }

    /// The renderer of `surface`, created on first use
    pub fn attach(&mut self, surface: &dyn MapSurface) -> &mut DualLayerRenderer {
        let (config, loader) = (&self.config, &self.loader);
        self.renderers.entry(surface.id()).or_insert_with(|| {
            log::info!("attaching overlay to {:?}", surface.id());
            DualLayerRenderer::new(surface.id(), config, loader.clone())
        })
    }

    pub fn get(&self, id: SurfaceId) -> Option<&DualLayerRenderer> {
        self.renderers.get(&id)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut DualLayerRenderer> {
        self.renderers.get_mut(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.renderers.contains_key(&id)
    }

    /// Disposes and drops the renderer of a live surface
    pub fn detach(&mut self, surface: &mut dyn MapSurface) -> bool {
        match self.renderers.remove(&surface.id()) {
            Some(mut renderer) => {
                renderer.dispose(surface);
                true
            }
            None => false,
        }
    }

    /// Drops the renderer of a surface that is already gone
    pub fn forget(&mut self, id: SurfaceId) -> bool {
        match self.renderers.remove(&id) {
            Some(mut renderer) => {
                renderer.dispose_detached();
                true
            }
            None => false,
        }
    }

    /// Drops every renderer, for application shutdown
    pub fn detach_all(&mut self) {
        for (_, mut renderer) in self.renderers.drain() {
            renderer.dispose_detached();
        }
    }

    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.renderers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }
}

impl Drop for OverlayRegistry {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl std::fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("surfaces", &self.renderers.len())
            .finish()
    }
}
