//! # Conditional strategies.
//!
//! - [`PerHandlerDispatch`] routes each handler by its declared
//!   [`DispatchMode`]: handlers of one event may run through different strategies.
//! - [`PerEventDispatch`] routes the whole handler set by a predicate on the event.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BusError;
use crate::events::Envelope;
use crate::handlers::{DispatchMode, HandlerDescriptor};

use super::{AsyncDispatch, Dispatch, DispatchRef, SyncDispatch};

/// Predicate over posted events.
pub type EventPredicate = Arc<dyn Fn(&Envelope) -> bool + Send + Sync>;

/// Routes every handler to the sync or async strategy according to its mode.
#[derive(Clone)]
pub struct PerHandlerDispatch {
    sync: DispatchRef,
    concurrent: DispatchRef,
}

impl PerHandlerDispatch {
    /// Creates a router over the given strategies.
    pub fn new(sync: DispatchRef, concurrent: DispatchRef) -> Self {
        Self { sync, concurrent }
    }

    fn route(&self, mode: DispatchMode) -> &DispatchRef {
        match mode {
            DispatchMode::Sync => &self.sync,
            DispatchMode::Async => &self.concurrent,
        }
    }
}

impl Default for PerHandlerDispatch {
    /// [`SyncDispatch`] for sync handlers, [`AsyncDispatch`] on the default pool otherwise.
    fn default() -> Self {
        Self::new(Arc::new(SyncDispatch), Arc::new(AsyncDispatch::default()))
    }
}

#[async_trait]
impl Dispatch for PerHandlerDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        for handler in handlers {
            self.route(handler.mode())
                .dispatch(event, std::slice::from_ref(handler))
                .await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "per-handler"
    }
}

impl fmt::Debug for PerHandlerDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerHandlerDispatch")
            .field("sync", &self.sync.name())
            .field("async", &self.concurrent.name())
            .finish()
    }
}

/// Routes the whole handler set to the async strategy when the predicate holds.
#[derive(Clone)]
pub struct PerEventDispatch {
    is_async: EventPredicate,
    concurrent: DispatchRef,
    sync: DispatchRef,
}

impl PerEventDispatch {
    /// Creates a router; `is_async` decides per event.
    pub fn new(is_async: EventPredicate, concurrent: DispatchRef, sync: DispatchRef) -> Self {
        Self {
            is_async,
            concurrent,
            sync,
        }
    }

    /// Router over [`AsyncDispatch`] (default pool) and [`SyncDispatch`].
    pub fn with_predicate<P>(is_async: P) -> Self
    where
        P: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        Self::new(
            Arc::new(is_async),
            Arc::new(AsyncDispatch::default()),
            Arc::new(SyncDispatch),
        )
    }
}

#[async_trait]
impl Dispatch for PerEventDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        if (self.is_async)(event) {
            self.concurrent.dispatch(event, handlers).await
        } else {
            self.sync.dispatch(event, handlers).await
        }
    }

    fn name(&self) -> &'static str {
        "per-event"
    }
}

impl fmt::Debug for PerEventDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerEventDispatch")
            .field("async", &self.concurrent.name())
            .field("sync", &self.sync.name())
            .finish_non_exhaustive()
    }
}
