//! # po-extract
//!
//! Batched detail extraction for purchase-order listings.
//!
//! A listing exposes an account identifier and a set of records, each with a
//! record identifier and a place to display it. For every record this crate fetches
//! the full detail from the account's REST API, derives a handful of display
//! fields from it and hands them to the record's render target.
//!
//! ## Design
//!
//! - **Paced batches** - detail requests go out in fixed-size concurrent batches,
//!   with a pause between batches to stay friendly to the API
//! - **Fault isolated** - a failed request is logged and counted, never fatal
//! - **Refetch-free re-rendering** - fetched payloads are cached, so switching
//!   between formatted and raw display re-renders without touching the network
//! - **Event-driven** - consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use po_extract::{
//!     AccountId, Config, ExtractSession, Presentation, RenderTarget, SourceRecord, StaticSource,
//! };
//!
//! struct Printer;
//!
//! impl RenderTarget for Printer {
//!     fn render(&self, presentation: &Presentation) {
//!         println!("{}: {:?}", presentation.record_id, presentation.columns());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ExtractSession::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = session.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let printer: Arc<dyn RenderTarget> = Arc::new(Printer);
//!     let source = StaticSource::new(Some(AccountId::from("12")))
//!         .with_record(SourceRecord::new("1042", &printer))
//!         .with_record(SourceRecord::new("1043", &printer));
//!
//!     let summary = session.run(&source).await?;
//!     println!("{} fetched, {} failed", summary.succeeded, summary.failed);
//!
//!     // Show the raw API values instead
//!     session.toggle_mode();
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Cache of fetched records
pub mod cache;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Detail fetching over the REST API
pub mod fetcher;
/// Derived display fields
pub mod presenter;
/// Paced batch scheduling
pub mod scheduler;
/// Extraction session
pub mod session;
/// Record listing seam
pub mod source;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use cache::{CacheEntry, PendingRender, RecordCache};
pub use config::{ApiConfig, BatchConfig, Config, PresentationConfig};
pub use error::{Error, FetchError, Result};
pub use fetcher::{DetailFetcher, HttpDetailFetcher};
pub use presenter::{Presenter, format_date};
pub use scheduler::{BatchScheduler, Settled};
pub use session::ExtractSession;
pub use source::{RecordSource, RenderTarget, SourceRecord, StaticSource};
pub use types::{
    AccountId, AgeClass, DisplayMode, Event, Presentation, RawPayload, RecordId, RunSummary,
};
