//! # Registry of handler descriptors keyed by declared event type.
//!
//! [`HandlerRegistry`] owns the only state shared between posting tasks:
//! a `RwLock<HashMap<EventType, Vec<HandlerDescriptor>>>` with set semantics per type.
//!
//! ## Rules
//! - `add_handlers` / `remove_handlers` take the write lock; `find_handlers` takes the
//!   read lock and clones the matches out before returning.
//! - A descriptor lives under exactly one type: its declared parameter type.
//! - Entries left empty by a removal are dropped.
//! - Removal runs type by type: types processed before a failing one stay removed.
//!
//! ## Lookup order
//! ```text
//! find_handlers(Title)
//!   resolver.expand(Title) = [Title, Text, Comparable, Ordered, CharSequence, AnyEvent]
//!   result = handlers[Title] ++ handlers[Text] ++ ... ++ handlers[AnyEvent]
//! ```
//! Most specific first, the root last, insertion order within a type.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::BusError;
use crate::events::{EventType, HierarchyResolver};

use super::descriptor::HandlerDescriptor;
use super::finder::HandlerFindResult;

/// Thread-safe store of registered handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<EventType, Vec<HandlerDescriptor>>>,
    resolver: HierarchyResolver,
}

impl HandlerRegistry {
    /// Creates an empty registry using `resolver` for lookups.
    pub fn new(resolver: HierarchyResolver) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            resolver,
        }
    }

    /// Creates a registry pre-filled with `found`, without awaiting the lock.
    pub fn with_handlers(resolver: HierarchyResolver, found: HandlerFindResult) -> Self {
        let mut handlers = HashMap::new();
        merge(&mut handlers, found);
        Self {
            handlers: RwLock::new(handlers),
            resolver,
        }
    }

    /// Merges `found` into the registry (set union per type).
    pub async fn add_handlers(&self, found: HandlerFindResult) {
        let mut handlers = self.handlers.write().await;
        merge(&mut handlers, found);
    }

    /// Removes every descriptor in `found`.
    ///
    /// Fails with [`BusError::UnknownHandler`] on the first type whose registered set
    /// does not contain all expected descriptors.
    pub async fn remove_handlers(&self, found: HandlerFindResult) -> Result<(), BusError> {
        for (ty, expected) in found {
            let mut handlers = self.handlers.write().await;
            let registered = handlers.get(&ty).map(Vec::as_slice).unwrap_or_default();

            if let Some(missing) = expected.iter().find(|d| !registered.contains(d)) {
                return Err(BusError::UnknownHandler {
                    target: missing.target_name(),
                    event: ty.name(),
                    method: missing.method_name(),
                });
            }

            if let Some(entry) = handlers.get_mut(&ty) {
                entry.retain(|d| !expected.contains(d));
                if entry.is_empty() {
                    handlers.remove(&ty);
                }
            }
            debug!(event = %ty, removed = expected.len(), "handlers removed");
        }
        Ok(())
    }

    /// Returns every handler reachable from the runtime type `ty`, most specific first.
    pub async fn find_handlers(&self, ty: EventType) -> Vec<HandlerDescriptor> {
        let types = self.resolver.expand(ty);
        let handlers = self.handlers.read().await;
        types
            .iter()
            .filter_map(|t| handlers.get(t))
            .flatten()
            .cloned()
            .collect()
    }

    /// Total number of registered descriptors.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.values().map(Vec::len).sum()
    }

    /// True if no handler is registered.
    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }

    /// The resolver used for lookups.
    pub fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }
}

fn merge(handlers: &mut HashMap<EventType, Vec<HandlerDescriptor>>, found: HandlerFindResult) {
    for (ty, incoming) in found {
        let entry = handlers.entry(ty).or_default();
        let before = entry.len();
        for descriptor in incoming {
            if !entry.contains(&descriptor) {
                entry.push(descriptor);
            }
        }
        debug!(event = %ty, added = entry.len() - before, "handlers added");
        if entry.is_empty() {
            handlers.remove(&ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::HandlerError;
    use crate::events::{AnyEvent, Event};
    use crate::handlers::{DeclaredFinder, HandlerFinder, Methods, Subscribe, Target};

    #[derive(Debug)]
    enum Comparable {}
    impl Event for Comparable {}

    #[derive(Debug)]
    struct Text;
    impl Event for Text {
        fn supertypes() -> Vec<EventType> {
            vec![EventType::of::<Comparable>()]
        }
    }

    struct Everything;

    impl Subscribe for Everything {
        fn handlers(methods: &mut Methods<Self>) {
            methods
                .on::<AnyEvent, _, _>("on_any", |_, _| async { Ok::<(), HandlerError>(()) })
                .on::<Comparable, _, _>("on_comparable", |_, _| async {
                    Ok::<(), HandlerError>(())
                })
                .on::<Text, _, _>("on_text", |_, _| async { Ok::<(), HandlerError>(()) });
        }
    }

    struct TextOnly;

    impl Subscribe for TextOnly {
        fn handlers(methods: &mut Methods<Self>) {
            methods.on::<Text, _, _>("on_text", |_, _| async { Ok::<(), HandlerError>(()) });
        }
    }

    fn find<T: Subscribe>(object: &Arc<T>) -> HandlerFindResult {
        DeclaredFinder::default()
            .find(&Target::new(object))
            .unwrap()
    }

    fn names(found: &[HandlerDescriptor]) -> Vec<&'static str> {
        found.iter().map(|d| d.method_name()).collect()
    }

    #[tokio::test]
    async fn test_find_orders_by_specificity() {
        let registry = HandlerRegistry::default();
        registry.add_handlers(find(&Arc::new(Everything))).await;

        let found = registry.find_handlers(EventType::of::<Text>()).await;
        assert_eq!(names(&found), vec!["on_text", "on_comparable", "on_any"]);

        let found = registry.find_handlers(EventType::of::<u32>()).await;
        assert_eq!(names(&found), vec!["on_any"]);
    }

    #[tokio::test]
    async fn test_add_is_a_union() {
        let registry = HandlerRegistry::default();
        let object = Arc::new(TextOnly);
        registry.add_handlers(find(&object)).await;
        registry.add_handlers(find(&object)).await;
        assert_eq!(registry.handler_count().await, 1);

        registry.add_handlers(find(&Arc::new(TextOnly))).await;
        assert_eq!(registry.handler_count().await, 2);
    }

    #[tokio::test]
    async fn test_find_without_match_is_empty() {
        let registry = HandlerRegistry::default();
        assert!(registry.find_handlers(EventType::of::<Text>()).await.is_empty());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_entries() {
        let object = Arc::new(Everything);
        let registry = HandlerRegistry::with_handlers(HierarchyResolver::new(), find(&object));
        assert_eq!(registry.handler_count().await, 3);

        registry.remove_handlers(find(&object)).await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unknown_fails() {
        let registry = HandlerRegistry::default();
        registry.add_handlers(find(&Arc::new(TextOnly))).await;

        let err = registry
            .remove_handlers(find(&Arc::new(TextOnly)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BusError::UnknownHandler {
                method: "on_text",
                ..
            }
        ));
        assert_eq!(registry.handler_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_keeps_earlier_types_removed() {
        let object = Arc::new(Everything);
        let registry = HandlerRegistry::default();
        registry.add_handlers(find(&object)).await;

        let mut request = find(&object);
        let stranger = find(&Arc::new(TextOnly)).remove(&EventType::of::<Text>()).unwrap();
        request
            .get_mut(&EventType::of::<Text>())
            .unwrap()
            .extend(stranger);

        let err = registry.remove_handlers(request).await.unwrap_err();
        assert_eq!(err.as_label(), "bus_unknown_handler");

        // The text entry always fails; entries visited before it are already gone.
        let left = registry.handler_count().await;
        assert!((1..=3).contains(&left));
        let found = registry.find_handlers(EventType::of::<Text>()).await;
        assert!(names(&found).contains(&"on_text"));
    }
}
