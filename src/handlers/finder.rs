//! # Handler discovery.
//!
//! A [`HandlerFinder`] turns a registered object ([`Target`]) into the descriptors the
//! registry stores, grouped by the declared parameter type.
//!
//! ## Rules
//! - Every handler method takes exactly one event parameter; anything else rejects the
//!   whole object with [`BusError::MalformedHandler`].
//! - Methods declared twice under the same name collapse into one descriptor.
//! - Every descriptor carries the reporter its failures are sent to.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::BusError;
use crate::events::EventType;
use crate::reporters::{LogReporter, ReportError};

use super::descriptor::HandlerDescriptor;
use super::target::Target;

/// Descriptors grouped by declared parameter type.
pub type HandlerFindResult = HashMap<EventType, Vec<HandlerDescriptor>>;

/// Discovers the handler methods of a registered object.
pub trait HandlerFinder: Send + Sync + 'static {
    /// Returns the object's handlers grouped by accepted type.
    fn find(&self, target: &Target) -> Result<HandlerFindResult, BusError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Finder reading the methods declared through [`Subscribe`](super::Subscribe).
#[derive(Clone)]
pub struct DeclaredFinder {
    reporter: Arc<dyn ReportError>,
}

impl DeclaredFinder {
    /// Creates a finder attaching `reporter` to every descriptor it produces.
    pub fn new(reporter: Arc<dyn ReportError>) -> Self {
        Self { reporter }
    }
}

impl Default for DeclaredFinder {
    fn default() -> Self {
        Self::new(Arc::new(LogReporter::default()))
    }
}

impl HandlerFinder for DeclaredFinder {
    fn find(&self, target: &Target) -> Result<HandlerFindResult, BusError> {
        let mut found = HandlerFindResult::new();
        for method in target.methods() {
            let &[accepts] = method.params() else {
                return Err(BusError::MalformedHandler {
                    target: target.name(),
                    method: method.name(),
                    params: method.params().len(),
                });
            };

            let descriptor = method.bind(target, accepts, Arc::clone(&self.reporter));
            let entry = found.entry(accepts).or_default();
            if !entry.contains(&descriptor) {
                trace!(target_name = target.name(), handler = %descriptor, "handler found");
                entry.push(descriptor);
            }
        }
        Ok(found)
    }

    fn name(&self) -> &'static str {
        "DeclaredFinder"
    }
}

impl std::fmt::Debug for DeclaredFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredFinder")
            .field("reporter", &self.reporter.name())
            .finish()
    }
}
