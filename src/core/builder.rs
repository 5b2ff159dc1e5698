//! # Builder assembling an [`EventBus`] from presets.
//!
//! [`EventBusBuilder`] consumes a [`Config`], picks defaults for every collaborator
//! left unset (finder, reporter, dispatch) and registers the initial handler objects.

use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{
    AsyncDispatch, BestMatchDispatch, BlockingAsyncDispatch, DispatchRef, EventPredicate,
    PerEventDispatch, PerHandlerDispatch, SequentialAsyncDispatch, SyncDispatch,
    UniqueDispatch, WorkerPool,
};
use crate::error::BusError;
use crate::events::{Envelope, HierarchyResolver};
use crate::handlers::{
    DeclaredFinder, HandlerFindResult, HandlerFinder, HandlerRegistry, Subscribe, Target,
};
use crate::reporters::{DeadEventLogger, LogReporter, ReportError};

use super::bus::EventBus;

/// Base delivery selected by the presets.
#[derive(Clone, Default)]
enum Delivery {
    #[default]
    PerHandler,
    Sync,
    Async,
    BlockingAsync,
    SequentialAsync,
    AsyncWhen(EventPredicate),
}

/// How an event matched by several handlers is treated.
#[derive(Clone, Default)]
enum Selection {
    #[default]
    All,
    BestMatch,
    Unique(EventPredicate),
}

/// Builder for constructing an [`EventBus`].
///
/// Presets pick a base delivery (`sync`, `async_dispatch`, `blocking_async`,
/// `sequential_async`, `async_when`, or per-handler by default) and optionally a
/// selection wrapped around it: `best_match` or `unique`/`unique_when`. The two
/// selections exclude each other; the one called last wins.
/// [`with_dispatch`](Self::with_dispatch) replaces all presets.
///
/// # Example
/// ```
/// use flexibus::EventBus;
///
/// let bus = EventBus::builder()
///     .with_label("orders")
///     .async_dispatch()
///     .unique_when(|event| event.is::<u64>())
///     .log_dead_events()
///     .build()
///     .unwrap();
/// assert_eq!(bus.to_string(), "EventBus[orders]");
/// ```
pub struct EventBusBuilder {
    cfg: Config,
    finder: Option<Arc<dyn HandlerFinder>>,
    reporter: Option<Arc<dyn ReportError>>,
    dispatch: Option<DispatchRef>,
    delivery: Delivery,
    selection: Selection,
    log_dead_events: bool,
    initial: Vec<Target>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            finder: None,
            reporter: None,
            dispatch: None,
            delivery: Delivery::default(),
            selection: Selection::default(),
            log_dead_events: false,
            initial: Vec::new(),
        }
    }

    /// Sets the label used in logs and `Display`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.cfg.label = label.into();
        self
    }

    /// Replaces the handler discovery.
    ///
    /// A custom finder attaches its own reporter; [`with_reporter`](Self::with_reporter)
    /// only affects the default [`DeclaredFinder`].
    pub fn with_finder(mut self, finder: Arc<dyn HandlerFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    /// Sets the sink receiving handler failures (default: [`LogReporter`]).
    pub fn with_reporter(mut self, reporter: Arc<dyn ReportError>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Uses `dispatch` as-is, ignoring every preset.
    pub fn with_dispatch(mut self, dispatch: DispatchRef) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Delivers every handler on the posting task.
    pub fn sync(mut self) -> Self {
        self.delivery = Delivery::Sync;
        self
    }

    /// Delivers every handler on the worker pool without waiting.
    pub fn async_dispatch(mut self) -> Self {
        self.delivery = Delivery::Async;
        self
    }

    /// Delivers every handler on the worker pool and waits for all of them.
    pub fn blocking_async(mut self) -> Self {
        self.delivery = Delivery::BlockingAsync;
        self
    }

    /// Delivers the handlers of every event in order on one spawned task, without waiting.
    pub fn sequential_async(mut self) -> Self {
        self.delivery = Delivery::SequentialAsync;
        self
    }

    /// Delivers events matching `is_async` on the worker pool, the rest synchronously.
    pub fn async_when<P>(mut self, is_async: P) -> Self
    where
        P: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        self.delivery = Delivery::AsyncWhen(Arc::new(is_async));
        self
    }

    /// Delivers only the most specific handler of every event.
    ///
    /// Replaces an earlier `unique`/`unique_when`.
    pub fn best_match(mut self) -> Self {
        self.selection = Selection::BestMatch;
        self
    }

    /// Fails any post matched by more than one handler.
    ///
    /// Replaces an earlier `best_match`.
    pub fn unique(self) -> Self {
        self.unique_when(|_| true)
    }

    /// Fails posts of events matching `is_unique` that are matched by more than one handler.
    pub fn unique_when<P>(mut self, is_unique: P) -> Self
    where
        P: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        self.selection = Selection::Unique(Arc::new(is_unique));
        self
    }

    /// Registers a [`DeadEventLogger`] logging undelivered events at `trace` level.
    pub fn log_dead_events(mut self) -> Self {
        self.log_dead_events = true;
        self
    }

    /// Registers `object` when the bus is built.
    pub fn with_handler<T: Subscribe>(mut self, object: Arc<T>) -> Self {
        self.initial.push(Target::new(&object));
        self
    }

    /// Builds the bus.
    ///
    /// Fails with [`BusError::MalformedHandler`] if an initial handler object declares
    /// an invalid handler method.
    pub fn build(mut self) -> Result<EventBus, BusError> {
        let reporter: Arc<dyn ReportError> = match self.reporter.take() {
            Some(reporter) => reporter,
            None => Arc::new(LogReporter::new(self.cfg.label.as_str())),
        };
        let finder: Arc<dyn HandlerFinder> = match self.finder.take() {
            Some(finder) => finder,
            None => Arc::new(DeclaredFinder::new(reporter)),
        };

        if self.log_dead_events {
            let logger = Arc::new(DeadEventLogger::new(self.cfg.label.as_str()));
            self.initial.push(Target::new(&logger));
        }

        let mut found = HandlerFindResult::new();
        for target in &self.initial {
            for (ty, handlers) in finder.find(target)? {
                found.entry(ty).or_default().extend(handlers);
            }
        }

        let resolver = if self.cfg.cache_hierarchy {
            HierarchyResolver::new()
        } else {
            HierarchyResolver::uncached()
        };
        let registry = HandlerRegistry::with_handlers(resolver, found);
        let strategy = self.strategy();

        Ok(EventBus::from_parts(
            self.cfg.label,
            registry,
            finder,
            strategy,
        ))
    }

    fn strategy(&self) -> DispatchRef {
        if let Some(dispatch) = &self.dispatch {
            return Arc::clone(dispatch);
        }

        let pool = || WorkerPool::new(self.cfg.worker_count());
        let base: DispatchRef = match &self.delivery {
            Delivery::PerHandler => Arc::new(PerHandlerDispatch::new(
                Arc::new(SyncDispatch),
                Arc::new(AsyncDispatch::new(pool())),
            )),
            Delivery::Sync => Arc::new(SyncDispatch),
            Delivery::Async => Arc::new(AsyncDispatch::new(pool())),
            Delivery::BlockingAsync => Arc::new(BlockingAsyncDispatch::new(pool())),
            Delivery::SequentialAsync => Arc::new(SequentialAsyncDispatch),
            Delivery::AsyncWhen(is_async) => Arc::new(PerEventDispatch::new(
                Arc::clone(is_async),
                Arc::new(AsyncDispatch::new(pool())),
                Arc::new(SyncDispatch),
            )),
        };

        match &self.selection {
            Selection::All => base,
            Selection::BestMatch => Arc::new(BestMatchDispatch::new(base)),
            Selection::Unique(is_unique) => {
                let is_unique = Arc::clone(is_unique);
                Arc::new(UniqueDispatch::when(base, move |event: &Envelope| {
                    is_unique(event)
                }))
            }
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
