//! # Worker pool for async strategies.
//!
//! [`WorkerPool`] bounds how many handler invocations run at the same time. Work is
//! spawned on the ambient tokio runtime right away; each task waits for a permit before
//! running and releases it when done.
//!
//! ```text
//! spawn(fut) ──► tokio::spawn ──► acquire permit ──► fut.await ──► release
//!                   (returns)        (waits when all `workers` are busy)
//! ```
//!
//! Clones share the same budget.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::{workers_by_load_factor, DEFAULT_LOAD_FACTOR, MAX_WORKERS};

/// Bounded budget of concurrently running handler invocations.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `workers` invocations at once.
    ///
    /// `workers` is clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let workers = workers.clamp(1, MAX_WORKERS);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Creates a pool sized as a share of the available CPUs.
    #[must_use]
    pub fn by_load_factor(load_factor: f64) -> Self {
        Self::new(workers_by_load_factor(load_factor))
    }

    /// Maximum number of concurrent invocations.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of idle workers right now.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Submits `fut`; returns as soon as it is spawned.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            fut.await;
        })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::by_load_factor(DEFAULT_LOAD_FACTOR)
    }
}
