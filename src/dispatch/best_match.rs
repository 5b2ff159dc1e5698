use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BusError;
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

use super::{Dispatch, DispatchRef, SyncDispatch};

/// Delivers only the first handler of the set.
///
/// The registry orders candidates most specific first, so this invokes the handler
/// declared for the closest type of the event.
#[derive(Clone)]
pub struct BestMatchDispatch {
    inner: DispatchRef,
}

impl BestMatchDispatch {
    pub fn new(inner: DispatchRef) -> Self {
        Self { inner }
    }
}

impl Default for BestMatchDispatch {
    fn default() -> Self {
        Self::new(Arc::new(SyncDispatch))
    }
}

#[async_trait]
impl Dispatch for BestMatchDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        match handlers.first() {
            Some(best) => {
                self.inner
                    .dispatch(event, std::slice::from_ref(best))
                    .await
            }
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "best-match"
    }
}

impl fmt::Debug for BestMatchDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestMatchDispatch")
            .field("inner", &self.inner.name())
            .finish()
    }
}
