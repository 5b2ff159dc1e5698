//! # Example: reentrant
//!
//! A handler posts a follow-up event while it is being invoked. The follow-up is queued
//! and delivered only after every handler of the original event has run.
//!
//! ## Flow
//! ```text
//! post("checkout")
//!   ├─► Cart::on_command("checkout")
//!   │      └─► post(Charged(100))        (queued)
//!   ├─► Journal::on_command("checkout")
//!   └─► Journal::on_charged(Charged(100))
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example reentrant
//! ```

use std::sync::{Arc, Mutex};

use flexibus::{Event, EventBus, HandlerError, Methods, Subscribe};

#[derive(Debug)]
struct Charged(u64);
impl Event for Charged {}

struct Cart {
    bus: EventBus,
}

impl Subscribe for Cart {
    fn handlers(methods: &mut Methods<Self>) {
        methods.on::<String, _, _>("on_command", |me, event| async move {
            let command = event.payload::<String>()?;
            println!("[cart] {command}: start");
            me.bus.post(Charged(100)).await?;
            println!("[cart] {command}: end");
            Ok::<(), HandlerError>(())
        });
    }
}

#[derive(Default)]
struct Journal {
    lines: Mutex<Vec<String>>,
}

impl Journal {
    fn write(&self, line: String) {
        println!("[journal] {line}");
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl Subscribe for Journal {
    fn handlers(methods: &mut Methods<Self>) {
        methods
            .on::<String, _, _>("on_command", |me, event| async move {
                me.write(format!("command {}", event.payload::<String>()?));
                Ok::<(), HandlerError>(())
            })
            .on::<Charged, _, _>("on_charged", |me, event| async move {
                me.write(format!("charged {}", event.payload::<Charged>()?.0));
                Ok::<(), HandlerError>(())
            });
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let bus = EventBus::builder().with_label("shop").sync().build()?;
    let journal = Arc::new(Journal::default());

    bus.register(&Arc::new(Cart { bus: bus.clone() })).await?;
    bus.register(&journal).await?;

    bus.post("checkout".to_string()).await?;

    let lines = journal.lines.lock().map(|l| l.clone()).unwrap_or_default();
    assert_eq!(lines, vec!["command checkout", "charged 100"]);
    Ok(())
}
