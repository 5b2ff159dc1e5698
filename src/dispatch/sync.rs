use async_trait::async_trait;

use crate::error::BusError;
use crate::events::Envelope;
use crate::handlers::HandlerDescriptor;

use super::Dispatch;

/// Invokes every handler in order on the posting task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncDispatch;

#[async_trait]
impl Dispatch for SyncDispatch {
    async fn dispatch(
        &self,
        event: &Envelope,
        handlers: &[HandlerDescriptor],
    ) -> Result<(), BusError> {
        for handler in handlers {
            handler.invoke(event).await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sync"
    }
}
