//! # Failure reporting and built-in logging handlers.
//!
//! ```text
//! HandlerDescriptor::invoke(&Envelope)
//!     │
//!     ├─ Ok(())                 ─► done
//!     ├─ Err(HandlerError)      ─┐
//!     └─ panic (catch_unwind)   ─┴─► ReportError::report(HandlerFailure)
//!                                        │
//!                                 ┌──────┴───────┐
//!                                 ▼              ▼
//!                            LogReporter      Custom sink
//!                            (tracing)      (metrics, alerts)
//! ```
//!
//! The reporter is attached to every descriptor by the handler finder, so each
//! failure is reported exactly once, from the task that ran the handler.

mod log;
mod reporter;

pub use log::{DeadEventLogger, LogReporter};
pub use reporter::{HandlerFailure, ReportError};
