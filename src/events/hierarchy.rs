//! # Hierarchy resolver: runtime type → every type it is assignable to.
//!
//! ```text
//! expand(Text)
//!   ├─► Text                       (the type itself, always first)
//!   ├─► Comparable, CharSequence   (declared supertypes, breadth-first)
//!   ├─► ...                        (their supertypes, transitively)
//!   └─► AnyEvent                   (root, always last)
//! ```
//!
//! ## Rules
//! - Deterministic: the same type always expands to the same ordered list.
//! - Breadth-first order doubles as a specificity order (closest types first).
//! - Duplicates (diamonds) and cycles in declared supertypes are collapsed.
//! - The cache is pure memoization; an uncached resolver routes identically.
//! - Concurrent lazy population is fine: racing writers store equal values.

use std::any::TypeId;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;

use super::event::EventType;

/// Expands runtime event types into their full ancestor sets.
#[derive(Debug)]
pub struct HierarchyResolver {
    cache: Option<DashMap<TypeId, Arc<[EventType]>>>,
}

impl HierarchyResolver {
    /// Creates a memoizing resolver.
    pub fn new() -> Self {
        Self {
            cache: Some(DashMap::new()),
        }
    }

    /// Creates a resolver that recomputes on every call.
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    /// Returns `ty` followed by all of its ancestors, ending with the root type.
    pub fn expand(&self, ty: EventType) -> Arc<[EventType]> {
        let Some(cache) = &self.cache else {
            return flatten(ty).into();
        };

        if let Some(hit) = cache.get(&ty.id()) {
            return Arc::clone(hit.value());
        }

        let flat: Arc<[EventType]> = flatten(ty).into();
        cache.insert(ty.id(), Arc::clone(&flat));
        flat
    }

    /// Number of memoized runtime types (always 0 when uncached).
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, DashMap::len)
    }
}

impl Default for HierarchyResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Breadth-first walk over declared supertypes; root appended last.
fn flatten(ty: EventType) -> Vec<EventType> {
    let root = EventType::root();
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([ty]);

    while let Some(next) = queue.pop_front() {
        if next == root || !seen.insert(next) {
            continue;
        }
        order.push(next);
        queue.extend(next.supertypes());
    }

    order.push(root);
    order
}
