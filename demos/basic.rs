//! # Example: basic
//!
//! Registers handlers along a small type hierarchy and posts a few events.
//!
//! Shows how to:
//! - Declare supertypes with [`Event::supertypes`] (a marker "interface").
//! - Implement [`Subscribe`] with handlers for several types.
//! - Observe dead events for values nobody handles.
//!
//! ## Flow
//! ```text
//! post(OrderPlaced)  ─► on_placed(OrderPlaced) ─► on_order(OrderEvent) ─► on_any(AnyEvent)
//! post(42u32)        ─► on_any(AnyEvent)
//! unregister(audit)
//! post(42u32)        ─► DeadEvent ─► on_dead
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=flexibus=debug cargo run --example basic
//! ```

use std::sync::Arc;

use flexibus::{AnyEvent, DeadEvent, Event, EventBus, EventType, HandlerError, Methods, Subscribe};
use tracing_subscriber::EnvFilter;

/// Marker for everything order related.
#[derive(Debug)]
enum OrderEvent {}
impl Event for OrderEvent {}

#[derive(Debug)]
struct OrderPlaced {
    id: u64,
    total_cents: u64,
}

impl Event for OrderPlaced {
    fn supertypes() -> Vec<EventType> {
        vec![EventType::of::<OrderEvent>()]
    }
}

struct Audit;

impl Subscribe for Audit {
    fn handlers(methods: &mut Methods<Self>) {
        methods
            .on::<OrderPlaced, _, _>("on_placed", |_me, event| async move {
                let order = event.payload::<OrderPlaced>()?;
                println!("[audit] placed #{} ({} cents)", order.id, order.total_cents);
                Ok::<(), HandlerError>(())
            })
            .on::<OrderEvent, _, _>("on_order", |_me, event| async move {
                println!("[audit] order event {}", event.event_type());
                Ok::<(), HandlerError>(())
            })
            .on::<AnyEvent, _, _>("on_any", |_me, event| async move {
                println!("[audit] saw {:?}", event);
                Ok::<(), HandlerError>(())
            });
    }
}

struct Undelivered;

impl Subscribe for Undelivered {
    fn handlers(methods: &mut Methods<Self>) {
        methods.on::<DeadEvent, _, _>("on_dead", |_me, event| async move {
            let dead = event.payload::<DeadEvent>()?;
            println!("[dead] nobody handled {:?}", dead.event());
            Ok::<(), HandlerError>(())
        });
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let bus = EventBus::builder()
        .with_label("basic")
        .sync()
        .with_handler(Arc::new(Undelivered))
        .build()?;

    let audit = Arc::new(Audit);
    bus.register(&audit).await?;
    println!("{bus}: {} handlers", bus.handler_count().await);

    bus.post(OrderPlaced {
        id: 1,
        total_cents: 4_200,
    })
    .await?;
    bus.post(42u32).await?;

    bus.unregister(&audit).await?;
    bus.post(42u32).await?;
    Ok(())
}
