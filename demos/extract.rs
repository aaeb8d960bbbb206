//! Extraction example
//!
//! Fetches the detail of a few orders and prints their derived fields, then
//! switches to raw display and prints them again from cache.
//!
//! ```bash
//! cargo run --example extract -- <account-id> <order-id>... [--config po-extract.json]
//! ```

use po_extract::{
    AccountId, Config, Event, ExtractSession, Presentation, RenderTarget, SourceRecord,
    StaticSource,
};
use std::sync::Arc;

/// Prints every presentation it receives as one table row
struct TableRow;

impl RenderTarget for TableRow {
    fn render(&self, presentation: &Presentation) {
        let [created, ordered, received, timestamp] = presentation.columns();
        println!(
            "{:>8} | {:<12} | {:<12} | {:<12} | {:<12} | {:?}",
            presentation.record_id, created, ordered, received, timestamp, presentation.age_class
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config = match args.iter().position(|a| a == "--config") {
        Some(flag) if flag + 1 < args.len() => {
            let path = args.remove(flag + 1);
            args.remove(flag);
            Config::from_json_file(path)?
        }
        _ => Config::default(),
    };

    let mut args = args.into_iter();
    let account = args.next().map(AccountId::from);
    let row: Arc<dyn RenderTarget> = Arc::new(TableRow);
    let mut source = StaticSource::new(account);
    for id in args {
        source.push(SourceRecord::new(id, &row));
    }

    let session = ExtractSession::new(config)?;

    // Progress subscriber
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Progress { completed, total } => {
                    eprintln!("[progress] {}/{}", completed, total);
                }
                Event::RecordFailed { id, error } => {
                    eprintln!("[failed] {}: {}", id, error);
                }
                _ => {}
            }
        }
    });

    let [created, ordered, received, timestamp] = Presentation::HEADERS;
    println!(
        "{:>8} | {:<12} | {:<12} | {:<12} | {:<12} | age",
        "order", created, ordered, received, timestamp
    );

    let summary = session.run(&source).await?;
    println!(
        "\n{} fetched, {} failed, {} skipped in {:?}",
        summary.succeeded, summary.failed, summary.skipped, summary.elapsed
    );

    println!("\nRaw values:");
    session.toggle_mode();

    Ok(())
}
