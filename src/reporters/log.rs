//! # Logging sinks
//!
//! - [`LogReporter`] default [`ReportError`]: logs each handler failure and moves on.
//! - [`DeadEventLogger`] handler object that logs every [`DeadEvent`] at `trace` level.
//!
//! ## Example output
//! ```text
//! ERROR flexibus: handler failed bus="orders" handler="Audit::on_order(OrderPlaced)" event="OrderPlaced" label="handler_failed" error: disk full
//! TRACE flexibus: dead event bus="orders" event="u32" payload=7
//! ```

use std::sync::Arc;

use tracing::{error, trace};

use crate::error::HandlerError;
use crate::events::DeadEvent;
use crate::handlers::{Methods, Subscribe};

use super::{HandlerFailure, ReportError};

/// Reporter that logs handler failures through `tracing`.
#[derive(Debug, Clone)]
pub struct LogReporter {
    label: Arc<str>,
}

impl LogReporter {
    /// Construct a reporter tagging every record with the bus label.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new("EventBus")
    }
}

impl ReportError for LogReporter {
    fn report(&self, failure: HandlerFailure) {
        error!(
            bus = %self.label,
            handler = %failure.handler,
            event = %failure.event.event_type(),
            seq = failure.event.seq(),
            label = failure.error.as_label(),
            "{}",
            failure.error.as_message()
        );
    }

    fn name(&self) -> &'static str {
        "LogReporter"
    }
}

/// Handler object that logs undelivered events.
#[derive(Debug, Clone)]
pub struct DeadEventLogger {
    label: Arc<str>,
}

impl DeadEventLogger {
    /// Construct a logger tagging every record with the bus label.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Subscribe for DeadEventLogger {
    fn handlers(methods: &mut Methods<Self>) {
        methods.on::<DeadEvent, _, _>("log_dead_event", |me, event| async move {
            let dead = event.payload::<DeadEvent>()?;
            trace!(
                bus = %me.label,
                event = %dead.event().event_type(),
                payload = ?dead.event(),
                "dead event"
            );
            Ok::<(), HandlerError>(())
        });
    }

    fn name(&self) -> &'static str {
        "DeadEventLogger"
    }
}
