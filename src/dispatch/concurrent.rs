//! # Worker-pool strategies.
//!
//! - [`AsyncDispatch`] submits one task per handler and returns once all are submitted.
//! - [`BlockingAsyncDispatch`] submits one task per handler and waits for all of them.
//! - [`SequentialAsyncDispatch`] submits one task per event that runs its handlers in order.
//!
//! With the pool strategies, handlers of one event run in parallel and their completion
//! order is unspecified.
//! A task that is lost before its handler finishes (runtime shutdown, abort) is reported
//! as [`HandlerError::Interrupted`] by the blocking variant.

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::error::{BusError, HandlerError};
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

use super::{Dispatch, WorkerPool};

/// Fire-and-forget delivery on a worker pool.
#[derive(Debug, Clone, Default)]
pub struct AsyncDispatch {
    pool: WorkerPool,
}

impl AsyncDispatch {
    #[must_use]
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

#[async_trait]
impl Dispatch for AsyncDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        for handler in handlers {
            let handler = handler.clone();
            let event = event.clone();
            self.pool.spawn(async move { handler.invoke(&event).await });
        }
        trace!(event = %event.event_type(), seq = event.seq(), submitted = handlers.len(), "handlers submitted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "async"
    }
}

/// Delivery on a worker pool that waits for every handler to finish.
#[derive(Debug, Clone, Default)]
pub struct BlockingAsyncDispatch {
    pool: WorkerPool,
}

impl BlockingAsyncDispatch {
    #[must_use]
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

#[async_trait]
impl Dispatch for BlockingAsyncDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        let submitted: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let task = handler.clone();
                let event = event.clone();
                let join = self.pool.spawn(async move { task.invoke(&event).await });
                (handler, join)
            })
            .collect();

        for (handler, join) in submitted {
            if let Err(err) = join.await {
                warn!(handler = %handler, error = %err, "handler task interrupted");
                handler.report(
                    event,
                    HandlerError::Interrupted {
                        reason: err.to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "blocking-async"
    }
}

/// Fire-and-forget delivery of the whole handler set on one spawned task.
///
/// Handlers of an event run one after another, in the order given. Separate events
/// get separate tasks and are not ordered relative to each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialAsyncDispatch;

#[async_trait]
impl Dispatch for SequentialAsyncDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        let handlers = handlers.to_vec();
        let event = event.clone();
        trace!(event = %event.event_type(), seq = event.seq(), submitted = handlers.len(), "handler sequence submitted");
        tokio::spawn(async move {
            for handler in &handlers {
                handler.invoke(&event).await;
            }
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sequential-async"
    }
}
