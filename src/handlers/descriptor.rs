//! # Handler descriptors: one handler method bound to one target object.
//!
//! Identity is the pair (target identity, method identity). Two descriptors built
//! independently for the same object and method compare equal, which is what
//! de-duplication in the registry and in the unique strategies relies on.
//!
//! ## Invocation boundary
//! ```text
//! invoke(&Envelope)
//!   └─► catch_unwind(invoker(envelope))
//!          ├─ Ok(Ok(()))   → done
//!          ├─ Ok(Err(e))   → reporter.report(e)
//!          └─ Err(panic)   → reporter.report(Panicked)
//! ```
//! Nothing escapes `invoke`: failures of one handler never stop sibling handlers.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::HandlerError;
use crate::events::{Envelope, EventType};
use crate::reporters::{HandlerFailure, ReportError};

/// Future returned by a handler body.
pub type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// Type-erased handler body bound to its target object.
pub(crate) type Invoker = Arc<dyn Fn(Envelope) -> HandlerFuture + Send + Sync>;

/// How a handler wants to be delivered when the per-handler strategy is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchMode {
    /// Run on the posting task (default).
    #[default]
    Sync,
    /// Run on a worker task.
    Async,
}

/// Identity of a registered handler object (its allocation address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

impl TargetId {
    /// Identity of the object behind `object`.
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        Self(Arc::as_ptr(object) as *const () as usize)
    }
}

/// Identity of a handler method: owner type and method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId {
    owner: TypeId,
    name: &'static str,
}

impl MethodId {
    pub(crate) fn new(owner: TypeId, name: &'static str) -> Self {
        Self { owner, name }
    }

    /// Declared method name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A handler method bound to a target object.
#[derive(Clone)]
pub struct HandlerDescriptor {
    target: TargetId,
    method: MethodId,
    target_name: &'static str,
    accepts: EventType,
    mode: DispatchMode,
    invoker: Invoker,
    reporter: Arc<dyn ReportError>,
}

impl HandlerDescriptor {
    pub(crate) fn new(
        target: TargetId,
        target_name: &'static str,
        method: MethodId,
        accepts: EventType,
        mode: DispatchMode,
        invoker: Invoker,
        reporter: Arc<dyn ReportError>,
    ) -> Self {
        Self {
            target,
            method,
            target_name,
            accepts,
            mode,
            invoker,
            reporter,
        }
    }

    /// Identity of the target object.
    #[inline]
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Name of the target object (for logs).
    #[inline]
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Identity of the handler method.
    #[inline]
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Declared method name.
    #[inline]
    pub fn method_name(&self) -> &'static str {
        self.method.name
    }

    /// Declared parameter type.
    #[inline]
    pub fn accepts(&self) -> EventType {
        self.accepts
    }

    /// Requested delivery mode.
    #[inline]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Runs the handler for `event`, reporting any failure.
    pub async fn invoke(&self, event: &Envelope) {
        let fut = async { (self.invoker)(event.clone()).await };
        let error = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(panic_err) => HandlerError::Panicked {
                info: panic_message(&*panic_err),
            },
        };
        self.report(event, error);
    }

    /// Forwards a failure for this handler to its reporter.
    pub fn report(&self, event: &Envelope, error: HandlerError) {
        self.reporter.report(HandlerFailure {
            handler: self.to_string(),
            event: event.clone(),
            error,
        });
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl PartialEq for HandlerDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.method == other.method
    }
}

impl Eq for HandlerDescriptor {}

impl Hash for HandlerDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state);
        self.method.hash(state);
    }
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}({})",
            self.target_name, self.method.name, self.accepts
        )
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("target", &self.target_name)
            .field("target_id", &self.target)
            .field("method", &self.method.name)
            .field("accepts", &self.accepts.name())
            .field("mode", &self.mode)
            .finish()
    }
}
