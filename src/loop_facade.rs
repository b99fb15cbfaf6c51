//! Cross-thread submission into the event loop, and blocking work offload.
//!
//! Grounded on how `client::simple::fetch` already uses
//! `tokio_core::reactor::Handle` plus `futures_cpupool::CpuPool` for DNS
//! resolution; this module just promotes that ad-hoc pairing into a
//! reusable, named facade so the server's file cache eviction and the
//! client's file-pull path can reuse the same worker pool instead of each
//! spinning up their own.
use std::sync::Arc;

use futures::{Future, IntoFuture};
use futures::sync::oneshot;
use futures_cpupool::CpuPool;
use tokio_core::reactor::{Handle, Remote};

/// A handle to the loop thread plus a pool of worker threads for
/// blocking calls (DNS resolution, filesystem reads past what
/// `FileCache` keeps memory-mapped).
#[derive(Clone)]
pub struct LoopFacade {
    remote: Remote,
    pool: Arc<CpuPool>,
}

impl LoopFacade {
    /// Wrap a loop handle. `workers` is the size of the blocking-call
    /// thread pool (DNS lookups, streamed file reads).
    pub fn new(handle: &Handle, workers: usize) -> LoopFacade {
        LoopFacade {
            remote: handle.remote().clone(),
            pool: Arc::new(CpuPool::new(workers)),
        }
    }

    /// Post a thunk to run on the loop thread. Safe to call from any
    /// thread; if already on the loop thread, prefer calling the closure
    /// directly instead.
    pub fn post<F>(&self, f: F)
        where F: FnOnce(&Handle) + Send + 'static
    {
        // `Remote::spawn` already coalesces wakeups on the underlying
        // reactor, so there's no separate wakeup-coalescing queue to
        // maintain here; we just adapt `FnOnce` to the `Remote` API.
        let mut f = Some(f);
        self.remote.spawn(move |handle| {
            if let Some(f) = f.take() {
                f(handle);
            }
            Ok(())
        });
    }

    /// Offload a blocking computation to a worker thread; the result is
    /// delivered back as a future resolved on the loop thread.
    pub fn queue_work<F, T, E>(&self, work: F)
        -> Box<dyn Future<Item = T, Error = E>>
        where F: FnOnce() -> Result<T, E> + Send + 'static,
              T: Send + 'static,
              E: Send + 'static,
    {
        Box::new(self.pool.spawn_fn(move || work().into_future()))
    }

    /// One-shot variant of `queue_work` that delivers its result through
    /// a channel instead of requiring the caller to hold the returned
    /// future; used by the server's `remove_cache` to marshal an
    /// eviction request from an arbitrary thread onto the loop thread.
    pub fn async_notify<T, F>(&self, work: F) -> oneshot::Receiver<T>
        where T: Send + 'static,
              F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn_fn(move || {
            let _ = tx.send(work());
            Ok::<_, ()>(())
        }).forget();
        rx
    }
}
