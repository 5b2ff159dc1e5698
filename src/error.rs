//! Error types used by the event bus and by handler invocations.
//!
//! This module defines two main error enums:
//!
//! - [`BusError`]: errors surfaced synchronously to the caller of `register`,
//!   `unregister` or `post`.
//! - [`HandlerError`]: failures of a single handler invocation. These never reach
//!   the caller of `post`; they are forwarded to the configured
//!   [`ReportError`](crate::ReportError) sink.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by the bus itself.
///
/// Registration errors are fatal to the `register`/`unregister` call that raised them.
/// [`BusError::NotUnique`] is fatal to the `post` call that raised it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A handler being removed was never registered (or was already unregistered).
    #[error("missing event handler {method} for {event}; is {target} registered?")]
    UnknownHandler {
        /// Type name of the handler object.
        target: &'static str,
        /// Declared event type the handler was expected under.
        event: &'static str,
        /// Method name of the first handler that was not found.
        method: &'static str,
    },

    /// A declared handler method does not take exactly one event parameter.
    #[error("handler method {target}::{method} requires {params} arguments; handler methods must require a single argument")]
    MalformedHandler {
        /// Type name of the handler object.
        target: &'static str,
        /// Declared method name.
        method: &'static str,
        /// Number of declared parameters.
        params: usize,
    },

    /// More than one handler matched an event that must be handled uniquely.
    #[error("more than one handler subscribed to unique event {event}: {handlers:?}")]
    NotUnique {
        /// Runtime type of the posted event.
        event: &'static str,
        /// Handlers that matched the event.
        handlers: Vec<String>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flexibus::BusError;
    ///
    /// let err = BusError::NotUnique { event: "u32", handlers: vec![] };
    /// assert_eq!(err.as_label(), "bus_not_unique");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::UnknownHandler { .. } => "bus_unknown_handler",
            BusError::MalformedHandler { .. } => "bus_malformed_handler",
            BusError::NotUnique { .. } => "bus_not_unique",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::UnknownHandler {
                target,
                event,
                method,
            } => format!("unknown handler: {target}::{method} for {event}"),
            BusError::MalformedHandler {
                target,
                method,
                params,
            } => format!("malformed handler: {target}::{method} takes {params} params"),
            BusError::NotUnique { event, handlers } => {
                format!("not unique: event={event} handlers={}", handlers.len())
            }
        }
    }
}

/// # Errors produced by a single handler invocation.
///
/// Caught at the invocation boundary and handed to the reporter; other handlers
/// for the same or later events keep running.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler body returned an error.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The handler expected a payload of a different concrete type.
    #[error("payload mismatch: expected {expected}, got {actual}")]
    Mismatch {
        /// Type the handler asked for.
        expected: &'static str,
        /// Runtime type of the posted event.
        actual: &'static str,
    },

    /// The handler panicked.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// A worker task running the handler was cancelled or aborted before completing.
    #[error("handler task interrupted: {reason}")]
    Interrupted {
        /// Reason reported by the runtime.
        reason: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    pub fn failed(error: impl std::fmt::Display) -> Self {
        HandlerError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flexibus::HandlerError;
    ///
    /// let err = HandlerError::failed("boom");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Mismatch { .. } => "handler_mismatch",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Interrupted { .. } => "handler_interrupted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Mismatch { expected, actual } => {
                format!("mismatch: expected={expected} actual={actual}")
            }
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Interrupted { reason } => format!("interrupted: {reason}"),
        }
    }
}

impl From<BusError> for HandlerError {
    /// Lets handlers propagate a failed nested `post` with `?`.
    fn from(err: BusError) -> Self {
        HandlerError::failed(err)
    }
}
