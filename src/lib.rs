//! # flexibus
//!
//! **Flexibus** is an in-process, type-routed publish/subscribe event bus for async Rust.
//!
//! Handler objects declare handler methods for event types; posting an event delivers it
//! to every handler whose declared type the event is assignable to: its own type, its
//! declared supertypes (transitively) and the universal root [`AnyEvent`]. How handlers
//! run (inline, on a worker pool, uniquely, best match only) is a pluggable
//! [`Dispatch`] strategy.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    register(&Arc<T: Subscribe>)                      post(event)
//!           │                                             │
//!           ▼                                             ▼
//! ┌───────────────────┐                      ┌─────────────────────────┐
//! │  HandlerFinder    │                      │  task-local context     │
//! │  (DeclaredFinder) │                      │  (FIFO queue per bus)   │
//! └────────┬──────────┘                      └────────────┬────────────┘
//!          │ EventType → [HandlerDescriptor]              │ route(event)
//!          ▼                                              ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ HandlerRegistry  RwLock<HashMap<EventType, [HandlerDescriptor]>> │
//! │   find_handlers(type) ─► HierarchyResolver::expand(type)         │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ none ─► post(DeadEvent(event))
//!                                 ▼
//!                     DispatchTask(event, handlers)
//!                                 │ drained in post order
//!                                 ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Dispatch: Sync │ Async │ BlockingAsync │ SequentialAsync         │
//! │           PerHandler │ PerEvent                                  │
//! │           Unique │ HandlerObjectUnique │ BestMatch (decorators)  │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 ▼
//!                HandlerDescriptor::invoke (catch_unwind)
//!                                 │ Err / panic
//!                                 ▼
//!                  ReportError (LogReporter by default)
//! ```
//!
//! ### Re-entrant posting
//! ```text
//! post(a) ─► handler1(a) ─► post(b)   (queued, returns Ok)
//!         ─► handler2(a)
//!         ─► handler(b)               (after every handler of a)
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types / traits                                  |
//! |-----------------|-----------------------------------------------------------|-----------------------------------------------------|
//! | **Events**      | Routable types, declared supertypes, dead events.         | [`Event`], [`EventType`], [`Envelope`], [`DeadEvent`] |
//! | **Handlers**    | Declare, discover and store handler methods.              | [`Subscribe`], [`Methods`], [`HandlerFinder`], [`HandlerRegistry`] |
//! | **Dispatch**    | Interchangeable, composable delivery policies.            | [`Dispatch`], [`WorkerPool`], [`UniqueDispatch`]    |
//! | **Reporting**   | Handler failures go to a sink, never to the poster.       | [`ReportError`], [`LogReporter`]                    |
//! | **Bus**         | Register, unregister, post; builder with presets.         | [`EventBus`], [`EventBusBuilder`], [`Config`]       |
//! | **Errors**      | Typed errors for the bus and for handler invocations.     | [`BusError`], [`HandlerError`]                      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flexibus::{Event, EventBus, EventType, HandlerError, Methods, Subscribe};
//!
//! #[derive(Debug)]
//! enum OrderEvent {}
//! impl Event for OrderEvent {}
//!
//! #[derive(Debug)]
//! struct OrderPlaced { id: u64 }
//! impl Event for OrderPlaced {
//!     fn supertypes() -> Vec<EventType> {
//!         vec![EventType::of::<OrderEvent>()]
//!     }
//! }
//!
//! struct Audit;
//!
//! impl Subscribe for Audit {
//!     fn handlers(methods: &mut Methods<Self>) {
//!         methods.on::<OrderEvent, _, _>("on_order", |_me, event| async move {
//!             let placed = event.payload::<OrderPlaced>()?;
//!             println!("order {} placed", placed.id);
//!             Ok::<(), HandlerError>(())
//!         });
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::builder()
//!         .with_label("orders")
//!         .sync()
//!         .log_dead_events()
//!         .with_handler(Arc::new(Audit))
//!         .build()?;
//!
//!     bus.post(OrderPlaced { id: 7 }).await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod dispatch;
mod error;
mod events;
mod handlers;
mod reporters;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{EventBus, EventBusBuilder};
pub use config::{workers_by_load_factor, Config, DEFAULT_LOAD_FACTOR, MAX_WORKERS};
pub use dispatch::{
    AsyncDispatch, BestMatchDispatch, BlockingAsyncDispatch, Dispatch, DispatchRef,
    EventPredicate, HandlerObjectUniqueDispatch, PerEventDispatch, PerHandlerDispatch,
    SequentialAsyncDispatch, SyncDispatch, UniqueDispatch, WorkerPool,
};
pub use error::{BusError, HandlerError};
pub use events::{AnyEvent, DeadEvent, Envelope, Event, EventType, HierarchyResolver};
pub use handlers::{
    DeclaredFinder, DispatchMode, HandlerDescriptor, HandlerFindResult, HandlerFinder,
    HandlerFuture, HandlerRegistry, MethodId, Methods, Subscribe, Target, TargetId,
    TargetMethod,
};
pub use reporters::{DeadEventLogger, HandlerFailure, LogReporter, ReportError};
