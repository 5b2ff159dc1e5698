//! # Uniqueness policies.
//!
//! - [`UniqueDispatch`] fails the post with [`BusError::NotUnique`] when an event that
//!   must be handled uniquely matched more than one handler. Nothing is invoked then.
//! - [`HandlerObjectUniqueDispatch`] keeps only the first handler of every target object.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::BusError;
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

use super::{Dispatch, DispatchRef, EventPredicate, SyncDispatch};

/// Rejects events matched by several handlers when the predicate demands uniqueness.
#[derive(Clone)]
pub struct UniqueDispatch {
    inner: DispatchRef,
    is_unique: EventPredicate,
}

impl UniqueDispatch {
    /// Every event must be handled uniquely.
    pub fn new(inner: DispatchRef) -> Self {
        Self::when(inner, |_: &Envelope| true)
    }

    /// Only events matching `is_unique` must be handled uniquely.
    pub fn when<P>(inner: DispatchRef, is_unique: P) -> Self
    where
        P: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            is_unique: Arc::new(is_unique),
        }
    }
}

impl Default for UniqueDispatch {
    fn default() -> Self {
        Self::new(Arc::new(SyncDispatch))
    }
}

#[async_trait]
impl Dispatch for UniqueDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        if handlers.len() > 1 && (self.is_unique)(event) {
            return Err(BusError::NotUnique {
                event: event.event_type().name(),
                handlers: handlers.iter().map(ToString::to_string).collect(),
            });
        }
        self.inner.dispatch(event, handlers).await
    }

    fn name(&self) -> &'static str {
        "unique"
    }
}

impl fmt::Debug for UniqueDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueDispatch")
            .field("inner", &self.inner.name())
            .finish_non_exhaustive()
    }
}

/// Delivers at most one handler per target object: the first one in the set.
#[derive(Clone)]
pub struct HandlerObjectUniqueDispatch {
    inner: DispatchRef,
}

impl HandlerObjectUniqueDispatch {
    pub fn new(inner: DispatchRef) -> Self {
        Self { inner }
    }
}

impl Default for HandlerObjectUniqueDispatch {
    fn default() -> Self {
        Self::new(Arc::new(SyncDispatch))
    }
}

#[async_trait]
impl Dispatch for HandlerObjectUniqueDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        let mut targets = HashSet::new();
        let kept: Vec<HandlerDescriptor> = handlers
            .iter()
            .filter(|h| targets.insert(h.target()))
            .cloned()
            .collect();
        if kept.len() < handlers.len() {
            trace!(event = %event.event_type(), dropped = handlers.len() - kept.len(), "duplicate target handlers dropped");
        }
        self.inner.dispatch(event, &kept).await
    }

    fn name(&self) -> &'static str {
        "handler-object-unique"
    }
}

impl fmt::Debug for HandlerObjectUniqueDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerObjectUniqueDispatch")
            .field("inner", &self.inner.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::{AnyEvent, EventType};
    use crate::handlers::{Methods, Subscribe};
    use crate::testing::{entries, handlers_of, Journal, Listener, Recording};

    /// Two handlers reachable from `u32` on one object.
    struct Twice {
        journal: Journal,
    }

    impl Subscribe for Twice {
        fn handlers(methods: &mut Methods<Self>) {
            methods
                .on::<u32, _, _>("exact", |me, _| async move {
                    me.journal.lock().unwrap().push("exact".to_string());
                    Ok::<(), HandlerError>(())
                })
                .on::<AnyEvent, _, _>("any", |me, _| async move {
                    me.journal.lock().unwrap().push("any".to_string());
                    Ok::<(), HandlerError>(())
                });
        }
    }

    fn two_number_handlers(journal: &Journal) -> Vec<HandlerDescriptor> {
        let reporter = Arc::new(Recording::default());
        let mut handlers = handlers_of(
            &Listener::new("a", journal),
            EventType::of::<u32>(),
            reporter.clone(),
        );
        handlers.extend(handlers_of(
            &Listener::new("b", journal),
            EventType::of::<u32>(),
            reporter,
        ));
        handlers
    }

    #[tokio::test]
    async fn test_rejects_before_invoking() {
        let journal = Journal::default();
        let handlers = two_number_handlers(&journal);

        let err = UniqueDispatch::default()
            .dispatch(&Envelope::new(5u32), &handlers)
            .await
            .unwrap_err();

        match err {
            BusError::NotUnique { event, handlers } => {
                assert_eq!(event, "u32");
                assert_eq!(handlers.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn test_single_handler_passes() {
        let journal = Journal::default();
        let handlers = two_number_handlers(&journal);

        UniqueDispatch::default()
            .dispatch(&Envelope::new(5u32), &handlers[..1])
            .await
            .unwrap();
        assert_eq!(entries(&journal), vec!["a:on_number:5"]);
    }

    #[tokio::test]
    async fn test_predicate_exempts_events() {
        let journal = Journal::default();
        let handlers = two_number_handlers(&journal);
        let strategy = UniqueDispatch::when(Arc::new(SyncDispatch), |event: &Envelope| {
            event.is::<String>()
        });

        strategy
            .dispatch(&Envelope::new(5u32), &handlers)
            .await
            .unwrap();
        assert_eq!(entries(&journal).len(), 2);
    }

    #[tokio::test]
    async fn test_object_unique_keeps_first_per_target() {
        let journal = Journal::default();
        let twice = Arc::new(Twice {
            journal: Arc::clone(&journal),
        });
        let reporter = Arc::new(Recording::default());
        let mut handlers = handlers_of(&twice, EventType::of::<u32>(), reporter.clone());
        handlers.extend(handlers_of(&twice, EventType::root(), reporter.clone()));
        handlers.extend(handlers_of(
            &Listener::new("p", &journal),
            EventType::of::<u32>(),
            reporter,
        ));

        HandlerObjectUniqueDispatch::default()
            .dispatch(&Envelope::new(9u32), &handlers)
            .await
            .unwrap();
        assert_eq!(entries(&journal), vec!["exact", "p:on_number:9"]);
    }
}
