//! Photo fetching for marker images.
//!
//! The overlay only depends on the [`PhotoLoader`] trait. [`HttpPhotoLoader`]
//! is the stock implementation: reqwest for transport, an in-memory LRU of
//! decoded photos and an optional on-disk cache of the raw bytes.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use lru::LruCache;
use once_cell::sync::Lazy;

use crate::{
    core::config::{CacheConfig, LoaderConfig},
    imaging::bitmap::DecodedPhoto,
    MapError, Result,
};

/// Shared async HTTP client used when no client is supplied
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> =
    Lazy::new(|| build_client(&LoaderConfig::default()).unwrap_or_default());

fn build_client(config: &LoaderConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.timeout_ms))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()?)
}

/// Fetch-and-decode capability consumed by the marker pipeline
#[async_trait]
pub trait PhotoLoader: Send + Sync {
    /// Fetches and decodes the photo at `url`, using any cache the loader keeps
    async fn fetch(&self, url: &str) -> Result<DecodedPhoto>;

    /// Whether `url` can be served without touching the network. Must not
    /// do I/O of its own.
    fn is_cached(&self, url: &str) -> bool;
}

pub struct HttpPhotoLoader {
    client: reqwest::Client,
    memory: Mutex<LruCache<String, Arc<RgbaImage>>>,
    disk_dir: Option<PathBuf>,
}

impl HttpPhotoLoader {
    pub fn new(loader: &LoaderConfig, cache: &CacheConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(loader)?, loader, cache))
    }

    pub fn with_client(client: reqwest::Client, loader: &LoaderConfig, cache: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(cache.photo_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            memory: Mutex::new(LruCache::new(capacity)),
            disk_dir: loader.disk_cache_dir.clone(),
        }
    }

    /// Location of `url` in the disk cache
    pub fn disk_path(&self, url: &str) -> Option<PathBuf> {
        self.disk_dir
            .as_ref()
            .map(|dir| dir.join(format!("{:016x}.photo", fxhash::hash64(url))))
    }

    fn remember(&self, url: &str, image: &RgbaImage) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(url.to_string(), Arc::new(image.clone()));
        }
    }

    fn from_memory(&self, url: &str) -> Option<RgbaImage> {
        let mut memory = self.memory.lock().ok()?;
        memory.get(url).map(|image| image.as_ref().clone())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MapError::Image(format!("HTTP {} for {}", response.status(), url)));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Decodes on the blocking pool; hands the bytes back for the disk cache
    async fn decode(bytes: Vec<u8>) -> Result<(RgbaImage, Vec<u8>)> {
        tokio::task::spawn_blocking(move || {
            let image = DecodedPhoto::decode(&bytes)?.into_software()?;
            Ok((image, bytes))
        })
        .await
        .map_err(|e| MapError::Image(format!("photo decode task failed: {}", e)))?
    }

    async fn store_on_disk(path: &Path, bytes: &[u8]) {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("cannot create photo cache dir {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(path, bytes).await {
            log::warn!("cannot write photo cache entry {}: {}", path.display(), e);
        }
    }
}

impl Default for HttpPhotoLoader {
    fn default() -> Self {
        Self::with_client(HTTP_CLIENT.clone(), &LoaderConfig::default(), &CacheConfig::default())
    }
}

#[async_trait]
impl PhotoLoader for HttpPhotoLoader {
    async fn fetch(&self, url: &str) -> Result<DecodedPhoto> {
        if let Some(image) = self.from_memory(url) {
            return Ok(DecodedPhoto::Software(image));
        }

        let disk_path = self.disk_path(url);
        if let Some(path) = &disk_path {
            match tokio::fs::read(path).await {
                Ok(bytes) => match Self::decode(bytes).await {
                    Ok((image, _)) => {
                        self.remember(url, &image);
                        return Ok(DecodedPhoto::Software(image));
                    }
                    Err(e) => {
                        log::warn!("discarding corrupt photo cache entry {}: {}", path.display(), e);
                        let _ = tokio::fs::remove_file(path).await;
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::debug!("photo cache read failed for {}: {}", path.display(), e),
            }
        }

        let (image, bytes) = Self::decode(self.download(url).await?).await?;
        if let Some(path) = &disk_path {
            Self::store_on_disk(path, &bytes).await;
        }
        self.remember(url, &image);
        Ok(DecodedPhoto::Software(image))
    }

    fn is_cached(&self, url: &str) -> bool {
        // Disk entries count only once read into memory.
        self.memory
            .lock()
            .map(|memory| memory.contains(url))
            .unwrap_or(false)
    }
}
