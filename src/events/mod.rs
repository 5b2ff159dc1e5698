//! Events: routable types, posted envelopes and the type-hierarchy resolver.
//!
//! ## Contents
//! - [`Event`], [`EventType`], [`AnyEvent`] routable types and their identities
//! - [`Envelope`] a posted event (shared payload + runtime type + sequence)
//! - [`DeadEvent`] wrapper re-posted when nothing handled an event
//! - [`HierarchyResolver`] expands a runtime type into every type it is assignable to
//!
//! ## Quick reference
//! - **Producers**: `EventBus::post` wraps values into envelopes.
//! - **Consumers**: `HandlerRegistry::find_handlers` (via the resolver) and handler
//!   bodies (via [`Envelope::payload`]).

mod event;
mod hierarchy;

pub use event::{AnyEvent, DeadEvent, Envelope, Event, EventType};
pub use hierarchy::HierarchyResolver;
