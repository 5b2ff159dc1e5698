//! # Declaring handler methods.
//!
//! A handler object implements [`Subscribe`] and lists its handler methods on a
//! [`Methods`] table. Each entry has a stable name (its identity), the event types it
//! accepts, a [`DispatchMode`] and an async body receiving the object and the posted
//! [`Envelope`].
//!
//! ```rust
//! use flexibus::{Envelope, HandlerError, Methods, Subscribe};
//!
//! struct Greeter;
//!
//! impl Subscribe for Greeter {
//!     fn handlers(methods: &mut Methods<Self>) {
//!         methods
//!             .on::<String, _, _>("greet", |_me, event| async move {
//!                 let name = event.payload::<String>()?;
//!                 println!("hello, {name}");
//!                 Ok::<(), HandlerError>(())
//!             })
//!             .on_async::<u32, _, _>("count", |_me, _event| async move {
//!                 Ok::<(), HandlerError>(())
//!             });
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::HandlerError;
use crate::events::{Envelope, Event, EventType};

use super::descriptor::{DispatchMode, HandlerFuture};

/// Erased body of a declared method, still typed over its owner.
pub(crate) type MethodBody<T> = Arc<dyn Fn(Arc<T>, Envelope) -> HandlerFuture + Send + Sync>;

/// An object exposing handler methods.
pub trait Subscribe: Send + Sync + 'static {
    /// Declares the handler methods of this type.
    fn handlers(methods: &mut Methods<Self>)
    where
        Self: Sized;

    /// Human-readable name (for logs and errors).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One declared method.
pub(crate) struct Declared<T> {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<EventType>,
    pub(crate) mode: DispatchMode,
    pub(crate) body: MethodBody<T>,
}

/// Table of handler methods declared by `T`.
pub struct Methods<T> {
    declared: Vec<Declared<T>>,
}

impl<T: Send + Sync + 'static> Methods<T> {
    pub(crate) fn new() -> Self {
        Self {
            declared: Vec::new(),
        }
    }

    /// Declares a handler for events assignable to `E`, delivered in [`DispatchMode::Sync`].
    pub fn on<E, F, Fut>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        E: Event,
        F: Fn(Arc<T>, Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.declare(name, vec![EventType::of::<E>()], DispatchMode::Sync, f)
    }

    /// Declares a handler for events assignable to `E`, delivered in [`DispatchMode::Async`].
    pub fn on_async<E, F, Fut>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        E: Event,
        F: Fn(Arc<T>, Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.declare(name, vec![EventType::of::<E>()], DispatchMode::Async, f)
    }

    /// Declares a handler with an explicit parameter list.
    ///
    /// The finder accepts only single-parameter methods; anything else fails registration
    /// with [`BusError::MalformedHandler`](crate::BusError::MalformedHandler).
    pub fn declare<F, Fut>(
        &mut self,
        name: &'static str,
        params: Vec<EventType>,
        mode: DispatchMode,
        f: F,
    ) -> &mut Self
    where
        F: Fn(Arc<T>, Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let body: MethodBody<T> = Arc::new(move |me, event| f(me, event).boxed());
        self.declared.push(Declared {
            name,
            params,
            mode,
            body,
        });
        self
    }

    /// Number of declared methods.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// True if nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub(crate) fn into_declared(self) -> Vec<Declared<T>> {
        self.declared
    }
}
