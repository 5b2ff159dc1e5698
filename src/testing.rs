//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::HandlerError;
use crate::events::{EventType, HierarchyResolver};
use crate::handlers::{
    DeclaredFinder, HandlerDescriptor, HandlerFinder, HandlerRegistry, Methods, Subscribe, Target,
};
use crate::reporters::{HandlerFailure, ReportError};

/// Reporter keeping every failure in memory.
#[derive(Default)]
pub(crate) struct Recording(Mutex<Vec<HandlerFailure>>);

impl Recording {
    pub(crate) fn labels(&self) -> Vec<&'static str> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.error.as_label())
            .collect()
    }
}

impl ReportError for Recording {
    fn report(&self, failure: HandlerFailure) {
        self.0.lock().unwrap().push(failure);
    }
}

/// Ordered log of handler invocations shared between listeners.
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

/// Handler object appending `label:method:payload` to a journal.
///
/// - `on_number` (sync) accepts `u32`
/// - `on_text` (async) accepts `String`
/// - `on_fail` (sync) accepts `bool` and always fails
pub(crate) struct Listener {
    pub(crate) label: &'static str,
    pub(crate) journal: Journal,
}

impl Listener {
    pub(crate) fn new(label: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label,
            journal: Arc::clone(journal),
        })
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl Subscribe for Listener {
    fn handlers(methods: &mut Methods<Self>) {
        methods
            .on::<u32, _, _>("on_number", |me, event| async move {
                let n = event.payload::<u32>()?;
                me.record(format!("{}:on_number:{n}", me.label));
                Ok::<(), HandlerError>(())
            })
            .on_async::<String, _, _>("on_text", |me, event| async move {
                let text = event.payload::<String>()?;
                me.record(format!("{}:on_text:{text}", me.label));
                Ok::<(), HandlerError>(())
            })
            .on::<bool, _, _>("on_fail", |me, _event| async move {
                me.record(format!("{}:on_fail", me.label));
                Err::<(), _>(HandlerError::failed("listener failure"))
            });
    }

    fn name(&self) -> &'static str {
        "Listener"
    }
}

/// Handlers of `object` accepting exactly `ty`.
pub(crate) fn handlers_of<T: Subscribe>(
    object: &Arc<T>,
    ty: EventType,
    reporter: Arc<dyn ReportError>,
) -> Vec<HandlerDescriptor> {
    DeclaredFinder::new(reporter)
        .find(&Target::new(object))
        .unwrap()
        .remove(&ty)
        .unwrap_or_default()
}

/// Registry holding the handlers of `objects`.
pub(crate) async fn registry_of(objects: &[Arc<Listener>]) -> HandlerRegistry {
    let registry = HandlerRegistry::new(HierarchyResolver::new());
    for object in objects {
        let found = DeclaredFinder::default()
            .find(&Target::new(object))
            .unwrap();
        registry.add_handlers(found).await;
    }
    registry
}

/// Snapshot of a journal.
pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Waits until the journal holds `n` entries (fails after one second).
pub(crate) async fn wait_for(journal: &Journal, n: usize) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        let seen = entries(journal);
        if seen.len() >= n {
            return seen;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {n} entries, got {seen:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
