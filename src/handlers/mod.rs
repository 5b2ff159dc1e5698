//! # Handlers: declaration, discovery and storage.
//!
//! ```text
//! Arc<T: Subscribe>
//!     │ Target::new            (erase object + declared methods)
//!     ▼
//! Target ──► HandlerFinder::find ──► HandlerFindResult { EventType → [HandlerDescriptor] }
//!                                          │
//!                        register ─────────┼──────── unregister
//!                                          ▼
//!                                  HandlerRegistry
//!                                          │ find_handlers(runtime type)
//!                                          ▼
//!                             [HandlerDescriptor] (most specific first)
//! ```
//!
//! ## Contents
//! - [`Subscribe`], [`Methods`] declaration surface for handler objects
//! - [`Target`], [`TargetMethod`] erased handler object
//! - [`HandlerFinder`], [`DeclaredFinder`] discovery (parameter-count validation)
//! - [`HandlerDescriptor`], [`DispatchMode`] one bound handler and its delivery mode
//! - [`HandlerRegistry`] type-keyed store with hierarchy-aware lookup

mod descriptor;
mod finder;
mod registry;
mod subscribe;
mod target;

pub use descriptor::{DispatchMode, HandlerDescriptor, HandlerFuture, MethodId, TargetId};
pub use finder::{DeclaredFinder, HandlerFindResult, HandlerFinder};
pub use registry::HandlerRegistry;
pub use subscribe::{Methods, Subscribe};
pub use target::{Target, TargetMethod};

