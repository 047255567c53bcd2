//! Runtime abstraction layer for async operations
//!
//! Photo loads are spawned through [`AsyncSpawner`] so that the overlay does
//! not care whether the host application already drives a tokio runtime.
//! Without one, a small multi-threaded runtime is started on first use.

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use once_cell::sync::Lazy;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Convenience function for spawning on the global spawner
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;
    use tokio::task::JoinHandle;

    static FALLBACK_RUNTIME: Lazy<Option<tokio::runtime::Runtime>> = Lazy::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("maplet-overlay-loader")
            .enable_all()
            .build()
            .map_err(|e| log::error!("cannot start fallback tokio runtime: {}", e))
            .ok()
    });

    /// Spawns on the ambient tokio runtime, or on a private one if there is none
    pub struct TokioSpawner;

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) -> Box<dyn AsyncHandle> {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                return Box::new(TokioHandle(handle.spawn(future)));
            }
            match FALLBACK_RUNTIME.as_ref() {
                Some(runtime) => Box::new(TokioHandle(runtime.spawn(future))),
                None => {
                    log::warn!("no tokio runtime available, dropping task");
                    Box::new(DroppedHandle)
                }
            }
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }

        fn cancel(&self) {
            self.0.abort();
        }
    }

    struct DroppedHandle;

    impl AsyncHandle for DroppedHandle {
        fn is_finished(&self) -> bool {
            true
        }

        fn cancel(&self) {}
    }
}

/// Global runtime instance
static RUNTIME: OnceLock<Box<dyn AsyncSpawner>> = OnceLock::new();

/// Initialize the runtime with a specific spawner. Only the first call wins.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::debug!("async runtime already initialised");
    }
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::TokioSpawner))
        .as_ref()
}
