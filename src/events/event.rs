//! # Events routed by the bus.
//!
//! Any `'static + Send + Sync + Debug` type becomes routable by implementing [`Event`].
//! Routing is driven by the event's runtime [`EventType`] and the types it is
//! assignable to: the type itself, its declared [`Event::supertypes`] (transitively)
//! and the universal root [`AnyEvent`].
//!
//! Rust has no class inheritance, so "superclasses" and "interfaces" are both expressed
//! as declared supertypes. An interface is usually a marker type that is never
//! instantiated:
//!
//! ```rust
//! use flexibus::{Event, EventType};
//!
//! /// Marker for events carrying an order id.
//! #[derive(Debug)]
//! pub enum OrderEvent {}
//! impl Event for OrderEvent {}
//!
//! #[derive(Debug)]
//! pub struct OrderPlaced { pub id: u64 }
//! impl Event for OrderPlaced {
//!     fn supertypes() -> Vec<EventType> {
//!         vec![EventType::of::<OrderEvent>()]
//!     }
//! }
//! ```
//!
//! Posted values travel as an [`Envelope`]: a cheaply cloneable shared payload plus its
//! resolved [`EventType`] and a global sequence number.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::error::HandlerError;

/// Global sequence counter for posted envelopes.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A value that can be posted on the bus.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// Direct supertypes (parent types and implemented marker interfaces).
    ///
    /// The root [`AnyEvent`] is implied and does not need to be listed.
    fn supertypes() -> Vec<EventType> {
        Vec::new()
    }
}

/// Universal root type: every event is assignable to it.
///
/// A handler registered for `AnyEvent` receives every posted event, so no
/// [`DeadEvent`] is ever produced on that bus.
#[derive(Debug)]
pub enum AnyEvent {}

impl Event for AnyEvent {}

macro_rules! impl_event {
    ($($ty:ty),* $(,)?) => {
        $(impl Event for $ty {})*
    };
}

impl_event!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    (), String, &'static str,
);

/// Runtime identity of an event type.
///
/// Equality and hashing use the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    supertypes: fn() -> Vec<EventType>,
}

impl EventType {
    /// Returns the identity of `T`.
    pub fn of<T: Event>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            supertypes: T::supertypes,
        }
    }

    /// Returns the identity of the universal root type [`AnyEvent`].
    pub fn root() -> Self {
        Self::of::<AnyEvent>()
    }

    /// Underlying [`TypeId`].
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared direct supertypes.
    pub fn supertypes(&self) -> Vec<EventType> {
        (self.supertypes)()
    }

    /// True for the universal root type.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == TypeId::of::<AnyEvent>()
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view over a posted payload.
trait Payload: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A posted event with its resolved runtime type.
///
/// - `seq`: monotonic global sequence, assigned at creation
/// - cloning shares the payload (`Arc`)
#[derive(Clone)]
pub struct Envelope {
    seq: u64,
    ty: EventType,
    payload: Arc<dyn Payload>,
}

impl Envelope {
    /// Wraps an owned event.
    pub fn new<E: Event>(event: E) -> Self {
        Self::from_arc(Arc::new(event))
    }

    /// Wraps an already shared event.
    ///
    /// Routes exactly like posting `E` by value.
    pub fn from_arc<E: Event>(event: Arc<E>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            ty: EventType::of::<E>(),
            payload: event,
        }
    }

    /// Global sequence number.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Runtime type of the payload.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.ty
    }

    /// True if the payload's concrete type is `T`.
    #[inline]
    pub fn is<T: Event>(&self) -> bool {
        self.ty.id() == TypeId::of::<T>()
    }

    /// Borrows the payload as `T` if that is its concrete type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        Payload::as_any(&*self.payload).downcast_ref::<T>()
    }

    /// Borrows the payload as `T`, or returns [`HandlerError::Mismatch`].
    ///
    /// Intended for use inside handler bodies with `?`.
    pub fn payload<T: Event>(&self) -> Result<&T, HandlerError> {
        self.downcast_ref::<T>().ok_or(HandlerError::Mismatch {
            expected: std::any::type_name::<T>(),
            actual: self.ty.name(),
        })
    }

    /// True if this envelope carries a [`DeadEvent`].
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.is::<DeadEvent>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("seq", &self.seq)
            .field("type", &self.ty.name())
            .field("payload", &self.payload)
            .finish()
    }
}

/// Wrapper posted for an event that had no matching handlers.
///
/// It is routed like any other event, so a `DeadEvent` handler is found the same way.
#[derive(Debug, Clone)]
pub struct DeadEvent {
    event: Envelope,
}

impl DeadEvent {
    /// Wraps the undelivered event.
    pub fn new(event: Envelope) -> Self {
        Self { event }
    }

    /// The original event.
    pub fn event(&self) -> &Envelope {
        &self.event
    }

    /// Unwraps the original event.
    pub fn into_event(self) -> Envelope {
        self.event
    }
}

impl Event for DeadEvent {}
