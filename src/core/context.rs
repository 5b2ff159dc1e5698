//! # Task-local dispatch context (re-entrant posting).
//!
//! Each logical call chain owns one [`DispatchContext`]: a FIFO queue of pending
//! [`DispatchTask`]s per bus. A bus is *dispatching* on the current task iff its queue
//! exists in the context.
//!
//! ```text
//! post(a)                        context: {}
//!   enter(bus) ─► Some(guard)    context: {bus: []}
//!   push(a)                      context: {bus: [a]}
//!   drain:
//!     next ─► a ─► handler(a)
//!                    post(b)     enter(bus) ─► None (already dispatching)
//!                                push(b)      context: {bus: [b]}
//!                                return Ok
//!                  sibling(a)    runs before b
//!     next ─► b ─► handler(b)
//!     next ─► None
//!   guard dropped                context: {}
//! ```
//!
//! ## Rules
//! - The outermost `post` of a call chain installs the context with `scope`.
//! - Tasks spawned by async strategies start without a context and install their own.
//! - Dropping the [`DrainGuard`] removes the bus queue, discarding what is left in it.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;

use crate::dispatch::DispatchRef;
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

tokio::task_local! {
    static DISPATCH: RefCell<DispatchContext>;
}

/// Pending delivery of one event.
pub(crate) struct DispatchTask {
    pub(crate) event: Envelope,
    pub(crate) handlers: Vec<HandlerDescriptor>,
    pub(crate) strategy: DispatchRef,
}

/// Per-call-chain queues, keyed by bus id.
#[derive(Default)]
pub(crate) struct DispatchContext {
    queues: HashMap<u64, VecDeque<DispatchTask>>,
}

/// Runs `fut` inside a dispatch context, installing one if the task has none.
pub(crate) async fn scoped<F: Future>(fut: F) -> F::Output {
    if DISPATCH.try_with(|_| ()).is_ok() {
        fut.await
    } else {
        DISPATCH
            .scope(RefCell::new(DispatchContext::default()), fut)
            .await
    }
}

/// Marks `bus` as dispatching. Returns `None` if it already was.
pub(crate) fn enter(bus: u64) -> Option<DrainGuard> {
    DISPATCH
        .try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            if ctx.queues.contains_key(&bus) {
                return None;
            }
            ctx.queues.insert(bus, VecDeque::new());
            Some(DrainGuard { bus })
        })
        .ok()
        .flatten()
}

/// True if `bus` is dispatching on the current task.
pub(crate) fn is_dispatching(bus: u64) -> bool {
    DISPATCH
        .try_with(|ctx| ctx.borrow().queues.contains_key(&bus))
        .unwrap_or(false)
}

/// Appends `task` to the queue of `bus`.
pub(crate) fn push(bus: u64, task: DispatchTask) {
    let _ = DISPATCH.try_with(|ctx| {
        ctx.borrow_mut()
            .queues
            .entry(bus)
            .or_default()
            .push_back(task);
    });
}

/// Takes the next pending task of `bus`.
pub(crate) fn next(bus: u64) -> Option<DispatchTask> {
    DISPATCH
        .try_with(|ctx| {
            ctx.borrow_mut()
                .queues
                .get_mut(&bus)
                .and_then(VecDeque::pop_front)
        })
        .ok()
        .flatten()
}

/// Ends the dispatching state of a bus when dropped.
pub(crate) struct DrainGuard {
    bus: u64,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = DISPATCH.try_with(|ctx| ctx.borrow_mut().queues.remove(&self.bus));
    }
}
