//! # Dispatch strategies: how a matched (event, handlers) pair is executed.
//!
//! Every strategy implements [`Dispatch`]. Strategies compose by wrapping an
//! [`DispatchRef`]:
//!
//! ```text
//!                UniqueDispatch ──► SyncDispatch
//!   HandlerObjectUniqueDispatch ──► AsyncDispatch ──► WorkerPool
//!             BestMatchDispatch ──► BlockingAsyncDispatch ──► WorkerPool
//!                                   SequentialAsyncDispatch ──► tokio::spawn (one per event)
//!            PerHandlerDispatch ──┬─► sync (DispatchMode::Sync)
//!                                 └─► async (DispatchMode::Async)
//!              PerEventDispatch ──┬─► async (predicate true)
//!                                 └─► sync (predicate false)
//! ```
//!
//! ## Rules
//! - Strategies never touch the registry.
//! - Handler failures are reported per invocation and never returned.
//! - The only error a strategy returns is a policy violation
//!   ([`BusError::NotUnique`](crate::BusError::NotUnique)); it is raised before any
//!   handler runs.

mod best_match;
mod concurrent;
mod per_handler;
mod pool;
mod sync;
mod unique;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BusError;
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

pub use best_match::BestMatchDispatch;
pub use concurrent::{AsyncDispatch, BlockingAsyncDispatch, SequentialAsyncDispatch};
pub use per_handler::{EventPredicate, PerEventDispatch, PerHandlerDispatch};
pub use pool::WorkerPool;
pub use sync::SyncDispatch;
pub use unique::{HandlerObjectUniqueDispatch, UniqueDispatch};

/// Shared handle to a dispatch strategy.
pub type DispatchRef = Arc<dyn Dispatch>;

/// # Policy executing handlers for one event.
///
/// `handlers` is ordered most specific first and is never empty when called by the bus.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use flexibus::{BusError, Dispatch, Envelope, HandlerDescriptor};
///
/// /// Runs handlers in reverse order.
/// struct Reversed;
///
/// #[async_trait]
/// impl Dispatch for Reversed {
///     async fn dispatch(
///         &self,
///         event: &Envelope,
///         handlers: &[HandlerDescriptor],
///     ) -> Result<(), BusError> {
///         for handler in handlers.iter().rev() {
///             handler.invoke(event).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    /// Executes `handlers` for `event`.
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
