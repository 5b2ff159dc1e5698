//! # Example: async_dispatch
//!
//! Compares the worker-pool presets and the uniqueness policy.
//!
//! Shows how to:
//! - Run handlers on a bounded [`WorkerPool`] (`async_dispatch` / `blocking_async`).
//! - Run an event's handlers one after another off the posting task (`sequential_async`).
//! - Mark single handlers async with `Methods::on_async` (default per-handler dispatch).
//! - Reject ambiguous events with `unique_when`.
//! - Collect handler failures with a custom [`ReportError`].
//!
//! ## Run
//! ```bash
//! RUST_LOG=flexibus=trace cargo run --example async_dispatch
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flexibus::{
    BusError, Config, EventBus, EventBusBuilder, HandlerError, HandlerFailure, Methods,
    ReportError, Subscribe,
};
use tracing_subscriber::EnvFilter;

/// Sleeps, then counts the job.
struct Worker {
    id: usize,
    done: Arc<AtomicUsize>,
}

impl Subscribe for Worker {
    fn handlers(methods: &mut Methods<Self>) {
        methods
            .on::<u64, _, _>("on_job", |me, event| async move {
                let millis = *event.payload::<u64>()?;
                tokio::time::sleep(Duration::from_millis(millis)).await;
                me.done.fetch_add(1, Ordering::SeqCst);
                Ok::<(), HandlerError>(())
            })
            .on_async::<String, _, _>("on_note", |me, event| async move {
                println!("[worker {}] note {}", me.id, event.payload::<String>()?);
                Ok::<(), HandlerError>(())
            })
            .on::<bool, _, _>("on_flag", |me, _event| async move {
                Err::<(), _>(HandlerError::failed(format!("worker {} rejects flags", me.id)))
            });
    }
}

/// Prints every handler failure.
struct Console;

impl ReportError for Console {
    fn report(&self, failure: HandlerFailure) {
        println!(
            "[report] {} failed on {}: {}",
            failure.handler,
            failure.event.event_type(),
            failure.error
        );
    }
}

async fn run(name: &str, builder: EventBusBuilder, workers: usize) -> anyhow::Result<()> {
    let done = Arc::new(AtomicUsize::new(0));
    let bus = builder.with_label(name).build()?;
    for id in 0..workers {
        bus.register(&Arc::new(Worker {
            id,
            done: Arc::clone(&done),
        }))
        .await?;
    }

    let started = Instant::now();
    bus.post(50u64).await?;
    println!(
        "[{bus}] post returned after {:?}, {} of {workers} jobs done",
        started.elapsed(),
        done.load(Ordering::SeqCst)
    );

    while done.load(Ordering::SeqCst) < workers {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    println!("[{bus}] all jobs done after {:?}", started.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config {
        workers: 2,
        ..Config::default()
    };

    run("async", EventBusBuilder::new(cfg.clone()).async_dispatch(), 6).await?;
    run("blocking", EventBusBuilder::new(cfg.clone()).blocking_async(), 6).await?;
    run("sequential", EventBusBuilder::new(cfg.clone()).sequential_async(), 6).await?;

    // Per-handler: `on_note` runs on the pool, `on_flag` inline and reports its failure.
    let bus = EventBusBuilder::new(cfg.clone())
        .with_label("mixed")
        .with_reporter(Arc::new(Console))
        .build()?;
    for id in 0..2 {
        bus.register(&Arc::new(Worker {
            id,
            done: Arc::new(AtomicUsize::new(0)),
        }))
        .await?;
    }
    bus.post("hello".to_string()).await?;
    bus.post(true).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Unique: jobs must have exactly one handler.
    let bus = EventBusBuilder::new(cfg)
        .with_label("unique")
        .unique_when(|event| event.is::<u64>())
        .build()?;
    for id in 0..2 {
        bus.register(&Arc::new(Worker {
            id,
            done: Arc::new(AtomicUsize::new(0)),
        }))
        .await?;
    }
    match bus.post(1u64).await {
        Err(err @ BusError::NotUnique { .. }) => println!("[{bus}] rejected: {err}"),
        other => println!("[{bus}] unexpected: {other:?}"),
    }
    Ok(())
}
