//! Asynchronous marker photo loads.
//!
//! Fetch, decode and composition run on the tokio pool. Finished icons come
//! back over a channel and are only ever applied by the owner on the main
//! context, after checking that the load's ticket is still the current one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use fxhash::FxHashMap;
use tokio::sync::Semaphore;

use crate::{
    data::poi::{Category, PoiId},
    imaging::{
        builder::MarkerImageBuilder,
        icon::{IconVariant, MarkerIcon},
        loader::PhotoLoader,
    },
    runtime::{self, AsyncHandle},
    MapError, Result,
};

/// One marker photo to fetch and compose
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub poi: PoiId,
    pub url: String,
    pub category: Category,
    pub variant: IconVariant,
}

/// A finished load, successful or not
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: u64,
    pub poi: PoiId,
    pub variant: IconVariant,
    pub icon: Result<MarkerIcon>,
}

struct InFlight {
    ticket: u64,
    handle: Box<dyn AsyncHandle>,
}

pub struct PhotoLoadQueue {
    loader: Arc<dyn PhotoLoader>,
    builder: Arc<MarkerImageBuilder>,
    semaphore: Arc<Semaphore>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    in_flight: FxHashMap<(PoiId, IconVariant), InFlight>,
    next_ticket: u64,
    closed: Arc<AtomicBool>,
}

impl PhotoLoadQueue {
    pub fn new(loader: Arc<dyn PhotoLoader>, builder: Arc<MarkerImageBuilder>, max_concurrent: usize) -> Self {
        let (tx, rx) = unbounded();
        Self {
            loader,
            builder,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tx,
            rx,
            in_flight: FxHashMap::default(),
            next_ticket: 1,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts a load unless one is already running for the same POI and
    /// variant. Returns the ticket of the running load, `None` once closed.
    pub fn enqueue(&mut self, request: LoadRequest) -> Option<u64> {
        if self.is_closed() {
            return None;
        }
        let key = (request.poi.clone(), request.variant);
        if let Some(running) = self.in_flight.get(&key) {
            return Some(running.ticket);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let loader = self.loader.clone();
        let builder = self.builder.clone();
        let semaphore = self.semaphore.clone();
        let closed = self.closed.clone();
        let tx = self.tx.clone();

        log::debug!("loading photo for {} ({:?}), ticket {}", request.poi, request.variant, ticket);
        let handle = runtime::spawn(async move {
            let LoadRequest {
                poi,
                url,
                category,
                variant,
            } = request;

            // Cached photos do not hold a network slot.
            let icon = if loader.is_cached(&url) {
                compose(loader, builder, url, category, variant).await
            } else {
                match semaphore.acquire_owned().await {
                    Ok(_permit) => compose(loader, builder, url, category, variant).await,
                    Err(_) => Err(MapError::Cancelled),
                }
            };

            if closed.load(Ordering::Acquire) {
                log::debug!("queue closed, dropping photo for {}", poi);
                return;
            }
            let _ = tx.send(LoadOutcome {
                ticket,
                poi,
                variant,
                icon,
            });
        });

        self.in_flight.insert(key, InFlight { ticket, handle });
        Some(ticket)
    }

    /// Aborts every load for `poi`
    pub fn cancel(&mut self, poi: &PoiId) {
        for variant in [IconVariant::Regular, IconVariant::Selected] {
            if let Some(running) = self.in_flight.remove(&(poi.clone(), variant)) {
                running.handle.cancel();
            }
        }
    }

    pub fn is_pending(&self, poi: &PoiId, variant: IconVariant) -> bool {
        self.in_flight.contains_key(&(poi.clone(), variant))
    }

    /// Finished loads whose ticket is still current. Results of cancelled or
    /// superseded loads are dropped here.
    pub fn drain_ready(&mut self) -> Vec<LoadOutcome> {
        let mut ready = Vec::new();
        for outcome in self.rx.try_iter() {
            if self.is_closed() {
                continue;
            }
            let key = (outcome.poi.clone(), outcome.variant);
            match self.in_flight.get(&key) {
                Some(running) if running.ticket == outcome.ticket => {
                    self.in_flight.remove(&key);
                    ready.push(outcome);
                }
                _ => log::debug!("dropping stale photo for {} (ticket {})", outcome.poi, outcome.ticket),
            }
        }
        ready
    }

    /// Cancels everything; later results are discarded
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.semaphore.close();
        for (_, running) in self.in_flight.drain() {
            running.handle.cancel();
        }
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

impl Drop for PhotoLoadQueue {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.close();
        }
    }
}

impl std::fmt::Debug for PhotoLoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoLoadQueue")
            .field("in_flight", &self.in_flight.len())
            .field("next_ticket", &self.next_ticket)
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn compose(
    loader: Arc<dyn PhotoLoader>,
    builder: Arc<MarkerImageBuilder>,
    url: String,
    category: Category,
    variant: IconVariant,
) -> Result<MarkerIcon> {
    let photo = loader.fetch(&url).await?;
    if !photo.is_cpu_drawable() {
        log::debug!("reading back hardware photo {}", url);
    }
    tokio::task::spawn_blocking(move || {
        let image = photo.into_software()?;
        builder.with_photo(&image, category, variant)
    })
    .await
        .map_err(|_| MapError::Cancelled)?
}
