//! # EventBus: registration façade and posting protocol.
//!
//! ```text
//! post(event)
//!   └─► scoped(..)                         (install task-local context if absent)
//!        ├─ enter(bus) ─► guard?           (None = a handler of this bus is posting)
//!        ├─ route(event)
//!        │    ├─ handlers = registry.find_handlers(type)
//!        │    ├─ non-empty    ─► push DispatchTask(event, handlers, strategy)
//!        │    ├─ empty, dead  ─► dropped
//!        │    └─ empty        ─► route(DeadEvent(event))
//!        ├─ guard None ─► return Ok        (outer drain loop delivers it)
//!        └─ drain: while let Some(task) = next(bus) { task.strategy.dispatch(..)? }
//! ```
//!
//! ## Rules
//! - Per call chain, events are delivered in the order they were posted, including
//!   events posted by handlers and dead-event re-posts.
//! - Handler failures are reported, never returned.
//! - A strategy error stops the drain, discards the pending tasks and is returned by
//!   the outermost `post`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::dispatch::{DispatchRef, PerHandlerDispatch};
use crate::error::BusError;
use crate::events::{DeadEvent, Envelope, Event, HierarchyResolver};
use crate::handlers::{DeclaredFinder, HandlerFinder, HandlerRegistry, Subscribe, Target};

use super::builder::EventBusBuilder;
use super::context::{self, DispatchTask};

static BUS_IDS: AtomicU64 = AtomicU64::new(1);

/// # In-process, type-routed publish/subscribe bus.
///
/// Cloning is cheap and yields a handle to the same bus, so handler objects may keep
/// one to post re-entrantly.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use flexibus::{EventBus, HandlerError, Methods, Subscribe};
///
/// struct Greeter;
///
/// impl Subscribe for Greeter {
///     fn handlers(methods: &mut Methods<Self>) {
///         methods.on::<String, _, _>("greet", |_me, event| async move {
///             println!("hello, {}", event.payload::<String>()?);
///             Ok::<(), HandlerError>(())
///         });
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), flexibus::BusError> {
/// let bus = EventBus::new();
/// bus.register(&Arc::new(Greeter)).await?;
/// bus.post("world".to_string()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    label: String,
    registry: HandlerRegistry,
    finder: Arc<dyn HandlerFinder>,
    strategy: DispatchRef,
}

impl EventBus {
    /// Creates a bus with the default configuration: declared handler discovery,
    /// per-handler dispatch and logged handler failures.
    #[must_use]
    pub fn new() -> Self {
        let cfg = Config::default();
        let resolver = HierarchyResolver::new();
        Self::from_parts(
            cfg.label,
            HandlerRegistry::new(resolver),
            Arc::new(DeclaredFinder::default()),
            Arc::new(PerHandlerDispatch::default()),
        )
    }

    /// Starts building a bus from the default [`Config`].
    #[must_use]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new(Config::default())
    }

    pub(crate) fn from_parts(
        label: String,
        registry: HandlerRegistry,
        finder: Arc<dyn HandlerFinder>,
        strategy: DispatchRef,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: BUS_IDS.fetch_add(1, Ordering::Relaxed),
                label,
                registry,
                finder,
                strategy,
            }),
        }
    }

    /// Identifying label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Name of the configured dispatch strategy.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        self.inner.strategy.name()
    }

    /// Registers every handler method declared by `object`.
    ///
    /// Registering the same object twice has no further effect.
    pub async fn register<T: Subscribe>(&self, object: &Arc<T>) -> Result<(), BusError> {
        let target = Target::new(object);
        let found = self.inner.finder.find(&target)?;
        debug!(
            bus = %self.inner.label,
            object = target.name(),
            handlers = found.values().map(Vec::len).sum::<usize>(),
            "register"
        );
        self.inner.registry.add_handlers(found).await;
        Ok(())
    }

    /// Removes every handler method declared by `object`.
    ///
    /// Fails with [`BusError::UnknownHandler`] if `object` is not registered.
    pub async fn unregister<T: Subscribe>(&self, object: &Arc<T>) -> Result<(), BusError> {
        let target = Target::new(object);
        let found = self.inner.finder.find(&target)?;
        debug!(bus = %self.inner.label, object = target.name(), "unregister");
        self.inner.registry.remove_handlers(found).await
    }

    /// Posts `event` to every handler whose declared type it is assignable to.
    pub async fn post<E: Event>(&self, event: E) -> Result<(), BusError> {
        self.post_envelope(Envelope::new(event)).await
    }

    /// Posts a shared event; routes exactly like posting the value itself.
    pub async fn post_arc<E: Event>(&self, event: Arc<E>) -> Result<(), BusError> {
        self.post_envelope(Envelope::from_arc(event)).await
    }

    /// Posts `event` if present; `None` is ignored.
    pub async fn post_opt<E: Event>(&self, event: Option<E>) -> Result<(), BusError> {
        match event {
            Some(event) => self.post(event).await,
            None => Ok(()),
        }
    }

    /// Posts an already wrapped event (e.g. the one a handler received).
    pub async fn post_envelope(&self, event: Envelope) -> Result<(), BusError> {
        context::scoped(self.enqueue_and_drain(event)).await
    }

    /// True while this bus is delivering events on the current task.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        context::is_dispatching(self.inner.id)
    }

    /// Total number of registered handler methods.
    pub async fn handler_count(&self) -> usize {
        self.inner.registry.handler_count().await
    }

    /// True if no handler is registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.registry.is_empty().await
    }

    async fn enqueue_and_drain(&self, event: Envelope) -> Result<(), BusError> {
        let guard = context::enter(self.inner.id);
        self.route(event).await;

        let Some(_guard) = guard else {
            return Ok(());
        };
        while let Some(task) = context::next(self.inner.id) {
            task.strategy.dispatch(&task.event, &task.handlers).await?;
        }
        Ok(())
    }

    async fn route(&self, event: Envelope) {
        let mut event = event;
        loop {
            let handlers = self.inner.registry.find_handlers(event.event_type()).await;
            if !handlers.is_empty() {
                trace!(
                    bus = %self.inner.label,
                    event = %event.event_type(),
                    seq = event.seq(),
                    handlers = handlers.len(),
                    "enqueue"
                );
                context::push(
                    self.inner.id,
                    DispatchTask {
                        event,
                        handlers,
                        strategy: Arc::clone(&self.inner.strategy),
                    },
                );
                return;
            }
            if event.is_dead() {
                trace!(bus = %self.inner.label, seq = event.seq(), "dead event unhandled");
                return;
            }
            trace!(bus = %self.inner.label, event = %event.event_type(), seq = event.seq(), "no handlers");
            event = Envelope::new(DeadEvent::new(event));
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus[{}]", self.inner.label)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("finder", &self.inner.finder.name())
            .field("strategy", &self.inner.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_test::traced_test;

    use super::*;
    use crate::error::HandlerError;
    use crate::events::{AnyEvent, EventType};
    use crate::handlers::Methods;
    use crate::testing::{entries, wait_for, Journal, Listener, Recording};

    #[derive(Debug)]
    enum Comparable {}
    impl Event for Comparable {}

    #[derive(Debug)]
    struct Text(&'static str);
    impl Event for Text {
        fn supertypes() -> Vec<EventType> {
            vec![EventType::of::<Comparable>()]
        }
    }

    /// Handlers for the root, `Text` and `Comparable`.
    struct Layers {
        journal: Journal,
    }

    impl Layers {
        fn record(&self, method: &str, event: &Envelope) {
            let text = event.downcast_ref::<Text>().map_or("?", |t| t.0);
            self.journal
                .lock()
                .unwrap()
                .push(format!("{method}:{text}"));
        }
    }

    impl Subscribe for Layers {
        fn handlers(methods: &mut Methods<Self>) {
            methods
                .on::<AnyEvent, _, _>("object", |me, event| async move {
                    me.record("object", &event);
                    Ok::<(), HandlerError>(())
                })
                .on::<Text, _, _>("text", |me, event| async move {
                    me.record("text", &event);
                    Ok::<(), HandlerError>(())
                })
                .on::<Comparable, _, _>("comparable", |me, event| async move {
                    me.record("comparable", &event);
                    Ok::<(), HandlerError>(())
                });
        }
    }

    /// Posts `7u32` while handling a `String`.
    struct Relay {
        bus: EventBus,
        journal: Journal,
    }

    impl Subscribe for Relay {
        fn handlers(methods: &mut Methods<Self>) {
            methods.on::<String, _, _>("relay", |me, _event| async move {
                me.journal.lock().unwrap().push("relay:start".to_string());
                me.bus.post(7u32).await?;
                assert!(me.bus.is_dispatching());
                me.journal.lock().unwrap().push("relay:end".to_string());
                Ok::<(), HandlerError>(())
            });
        }
    }

    /// Collects dead events.
    #[derive(Default)]
    struct Graveyard {
        seen: Mutex<Vec<String>>,
    }

    impl Subscribe for Graveyard {
        fn handlers(methods: &mut Methods<Self>) {
            methods.on::<DeadEvent, _, _>("bury", |me, event| async move {
                let dead = event.payload::<DeadEvent>()?;
                let name = dead.event().event_type().name().to_string();
                me.seen.lock().unwrap().push(name);
                Ok::<(), HandlerError>(())
            });
        }
    }

    fn sync_bus() -> EventBus {
        EventBus::builder().sync().build().unwrap()
    }

    #[tokio::test]
    async fn test_delivers_to_every_assignable_type() {
        let bus = sync_bus();
        let journal = Journal::default();
        bus.register(&Arc::new(Layers {
            journal: Arc::clone(&journal),
        }))
        .await
        .unwrap();

        bus.post(Text("Hello")).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec!["text:Hello", "comparable:Hello", "object:Hello"]
        );
    }

    #[tokio::test]
    async fn test_unhandled_event_becomes_dead_event() {
        let bus = sync_bus();
        let graveyard = Arc::new(Graveyard::default());
        bus.register(&graveyard).await.unwrap();

        bus.post(1.5f64).await.unwrap();
        bus.post_opt(None::<u8>).await.unwrap();

        assert_eq!(*graveyard.seen.lock().unwrap(), vec!["f64"]);
    }

    #[tokio::test]
    async fn test_dead_event_without_handler_is_dropped() {
        let bus = sync_bus();
        bus.post(3u8).await.unwrap();
        assert!(!bus.is_dispatching());
    }

    #[tokio::test]
    async fn test_root_handler_suppresses_dead_events() {
        let bus = sync_bus();
        let journal = Journal::default();
        let graveyard = Arc::new(Graveyard::default());
        bus.register(&graveyard).await.unwrap();
        bus.register(&Arc::new(Layers {
            journal: Arc::clone(&journal),
        }))
        .await
        .unwrap();

        bus.post(9i64).await.unwrap();

        assert_eq!(entries(&journal), vec!["object:?"]);
        assert!(graveyard.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reentrant_post_runs_after_siblings() {
        let bus = sync_bus();
        let journal = Journal::default();
        let relay = Arc::new(Relay {
            bus: bus.clone(),
            journal: Arc::clone(&journal),
        });
        bus.register(&relay).await.unwrap();
        bus.register(&Listener::new("p", &journal)).await.unwrap();

        bus.post("go".to_string()).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec!["relay:start", "relay:end", "p:on_text:go", "p:on_number:7"]
        );
        assert!(!bus.is_dispatching());
    }

    #[tokio::test]
    async fn test_post_to_other_bus_from_handler_is_immediate() {
        let outer = sync_bus();
        let inner = sync_bus();
        let journal = Journal::default();
        outer
            .register(&Arc::new(Relay {
                bus: inner.clone(),
                journal: Arc::clone(&journal),
            }))
            .await
            .unwrap();
        inner.register(&Listener::new("p", &journal)).await.unwrap();

        outer.post("go".to_string()).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec!["relay:start", "p:on_number:7", "relay:end"]
        );
    }

    #[tokio::test]
    async fn test_unregister_unknown_object_fails() {
        let bus = sync_bus();
        let journal = Journal::default();
        let listener = Listener::new("p", &journal);

        let err = bus.unregister(&listener).await.unwrap_err();
        assert_eq!(err.as_label(), "bus_unknown_handler");

        bus.register(&listener).await.unwrap();
        bus.register(&listener).await.unwrap();
        assert_eq!(bus.handler_count().await, 3);

        bus.unregister(&listener).await.unwrap();
        assert!(bus.is_empty().await);
        assert!(bus.unregister(&listener).await.is_err());

        bus.post(1u32).await.unwrap();
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn test_unique_violation_invokes_nothing() {
        let bus = EventBus::builder().sync().unique().build().unwrap();
        let journal = Journal::default();
        bus.register(&Listener::new("a", &journal)).await.unwrap();
        bus.register(&Listener::new("b", &journal)).await.unwrap();

        let err = bus.post(5u32).await.unwrap_err();
        assert!(matches!(err, BusError::NotUnique { event: "u32", .. }));
        assert!(entries(&journal).is_empty());
        assert!(!bus.is_dispatching());

        bus.post(true).await.unwrap_err();
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn test_reentrant_dead_event_keeps_order() {
        /// Posts an unhandled `f64` and then a `u32` while handling a `String`.
        struct Chain {
            bus: EventBus,
            journal: Journal,
        }

        impl Chain {
            fn record(&self, entry: impl Into<String>) {
                self.journal.lock().unwrap().push(entry.into());
            }
        }

        impl Subscribe for Chain {
            fn handlers(methods: &mut Methods<Self>) {
                methods
                    .on::<String, _, _>("start", |me, _| async move {
                        me.record("a:start");
                        me.bus.post(2.5f64).await?;
                        me.bus.post(9u32).await?;
                        me.record("a:end");
                        Ok::<(), HandlerError>(())
                    })
                    .on::<DeadEvent, _, _>("bury", |me, event| async move {
                        let dead = event.payload::<DeadEvent>()?;
                        me.record(format!("dead:{}", dead.event().event_type().name()));
                        Ok::<(), HandlerError>(())
                    })
                    .on::<u32, _, _>("count", |me, _| async move {
                        me.record("num");
                        Ok::<(), HandlerError>(())
                    });
            }
        }

        /// Second `String` handler, registered after [`Chain`].
        struct Sibling {
            journal: Journal,
        }

        impl Subscribe for Sibling {
            fn handlers(methods: &mut Methods<Self>) {
                methods.on::<String, _, _>("sibling", |me, _| async move {
                    me.journal.lock().unwrap().push("b".to_string());
                    Ok::<(), HandlerError>(())
                });
            }
        }

        let bus = sync_bus();
        let journal = Journal::default();
        bus.register(&Arc::new(Chain {
            bus: bus.clone(),
            journal: Arc::clone(&journal),
        }))
        .await
        .unwrap();
        bus.register(&Arc::new(Sibling {
            journal: Arc::clone(&journal),
        }))
        .await
        .unwrap();

        bus.post("go".to_string()).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec!["a:start", "a:end", "b", "dead:f64", "num"]
        );
        assert!(!bus.is_dispatching());
    }

    #[tokio::test]
    async fn test_handler_failures_are_isolated() {
        let reporter = Arc::new(Recording::default());
        let bus = EventBus::builder()
            .sync()
            .with_reporter(reporter.clone())
            .build()
            .unwrap();
        let journal = Journal::default();
        bus.register(&Listener::new("a", &journal)).await.unwrap();
        bus.register(&Listener::new("b", &journal)).await.unwrap();

        bus.post(true).await.unwrap();
        bus.post(2u32).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec!["a:on_fail", "b:on_fail", "a:on_number:2", "b:on_number:2"]
        );
        assert_eq!(reporter.labels(), vec!["handler_failed", "handler_failed"]);
    }

    #[tokio::test]
    async fn test_post_arc_routes_like_value() {
        let bus = sync_bus();
        let journal = Journal::default();
        bus.register(&Listener::new("p", &journal)).await.unwrap();

        bus.post_arc(Arc::new(4u32)).await.unwrap();
        bus.post(4u32).await.unwrap();

        assert_eq!(entries(&journal), vec!["p:on_number:4", "p:on_number:4"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_handlers_post_in_their_own_context() {
        let bus = EventBus::new();
        let journal = Journal::default();

        /// Async-mode handler that posts a number.
        struct Spawner {
            bus: EventBus,
        }

        impl Subscribe for Spawner {
            fn handlers(methods: &mut Methods<Self>) {
                methods.on_async::<String, _, _>("spawn", |me, _| async move {
                    assert!(!me.bus.is_dispatching());
                    me.bus.post(11u32).await?;
                    Ok::<(), HandlerError>(())
                });
            }
        }

        bus.register(&Arc::new(Spawner { bus: bus.clone() }))
            .await
            .unwrap();
        bus.register(&Listener::new("p", &journal)).await.unwrap();

        bus.post("start".to_string()).await.unwrap();

        let seen = wait_for(&journal, 2).await;
        assert!(seen.contains(&"p:on_text:start".to_string()));
        assert!(seen.contains(&"p:on_number:11".to_string()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dead_events_are_logged() {
        let bus = EventBus::builder()
            .with_label("audit")
            .log_dead_events()
            .build()
            .unwrap();

        bus.post(42u16).await.unwrap();

        assert!(logs_contain("dead event"));
        assert!(logs_contain("u16"));
    }

    #[test]
    fn test_display() {
        let bus = EventBus::builder().with_label("orders").build().unwrap();
        assert_eq!(bus.to_string(), "EventBus[orders]");
        assert_eq!(bus.label(), "orders");
        assert_eq!(bus.strategy(), "per-handler");
    }
}
