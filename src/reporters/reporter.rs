//! # Failure reporting sink
//!
//! `ReportError` is the extension point invoked once per failed handler invocation.
//! Handler failures never propagate to the caller of `post`; they end up here.
//!
//! ## Contract
//! - Called synchronously from whichever task ran the handler (caller task for sync
//!   dispatch, a worker task for async dispatch).
//! - Must not block for long; hand heavy work off to a channel if needed.
//!
//! ## Example
//! ```rust
//! use std::sync::Mutex;
//! use flexibus::{HandlerFailure, ReportError};
//!
//! #[derive(Default)]
//! struct Recording(Mutex<Vec<String>>);
//!
//! impl ReportError for Recording {
//!     fn report(&self, failure: HandlerFailure) {
//!         self.0.lock().unwrap().push(failure.error.as_label().to_string());
//!     }
//! }
//! ```

use crate::error::HandlerError;
use crate::events::Envelope;

/// One failed handler invocation.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    /// Handler description (`Target::method(EventType)`).
    pub handler: String,
    /// The event being delivered.
    pub event: Envelope,
    /// What went wrong.
    pub error: HandlerError,
}

/// Sink for handler invocation failures.
pub trait ReportError: Send + Sync + 'static {
    /// Handle one failure.
    fn report(&self, failure: HandlerFailure);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
