//! Batch scheduler: bounded-concurrency detail fetching with inter-batch pacing.
//!
//! Records are split into consecutive batches of `batch_size`. All fetches of a
//! batch are in flight together; the next batch starts only after every fetch of
//! the current one has settled and `inter_batch_delay` has passed. With
//! `trailing_delay` enabled the pause also follows the final batch.
//!
//! The fetches of a batch are polled from the calling task, so settlements are
//! handed to the `on_settled` callback one at a time, in completion order. A failed
//! fetch is just another settlement: siblings keep running and the run continues.
//!
//! # Example
//!
//! ```no_run
//! use po_extract::config::{ApiConfig, BatchConfig};
//! use po_extract::fetcher::HttpDetailFetcher;
//! use po_extract::scheduler::BatchScheduler;
//! use po_extract::{AccountId, RecordId};
//!
//! # async fn example() -> po_extract::Result<()> {
//! let fetcher = HttpDetailFetcher::new(&ApiConfig::default())?;
//! let scheduler = BatchScheduler::new(&BatchConfig::default());
//! let jobs = vec![(RecordId::from("1042"), ()), (RecordId::from("1043"), ())];
//!
//! let summary = scheduler
//!     .run(&AccountId::from("12"), jobs, &fetcher, |settled| {
//!         println!("{}/{} {}", settled.completed, settled.total, settled.id);
//!     })
//!     .await;
//! assert_eq!(summary.attempted(), 2);
//! # Ok(())
//! # }
//! ```

use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;

use crate::config::BatchConfig;
use crate::error::FetchError;
use crate::fetcher::DetailFetcher;
use crate::types::{AccountId, RawPayload, RecordId, RunSummary};

/// One settled fetch attempt
#[derive(Debug)]
pub struct Settled<T> {
    /// Record that was fetched
    pub id: RecordId,
    /// Caller data that travelled with the record
    pub context: T,
    /// Fetch outcome
    pub result: Result<RawPayload, FetchError>,
    /// Attempts settled so far, including this one
    pub completed: usize,
    /// Attempts in the whole run
    pub total: usize,
}

/// Drives fetches in paced, fixed-size batches
#[derive(Clone, Debug)]
pub struct BatchScheduler {
    batch_size: usize,
    inter_batch_delay: Duration,
    trailing_delay: bool,
}

impl BatchScheduler {
    /// Create a scheduler from batch settings
    ///
    /// A zero batch size is treated as one; [`Config::validate`](crate::Config::validate)
    /// rejects it before it gets here.
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            inter_batch_delay: config.inter_batch_delay,
            trailing_delay: config.trailing_delay,
        }
    }

    /// Records fetched together per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches `records` records are split into
    pub fn batch_count(&self, records: usize) -> usize {
        records.div_ceil(self.batch_size)
    }

    /// Attempt every job exactly once, batch by batch
    ///
    /// `on_settled` is called after each attempt settles, with a running count that
    /// reaches `jobs.len()` when the run completes. The returned summary leaves
    /// `skipped` at zero.
    pub async fn run<T, F>(
        &self,
        account: &AccountId,
        jobs: Vec<(RecordId, T)>,
        fetcher: &dyn DetailFetcher,
        mut on_settled: F,
    ) -> RunSummary
    where
        T: Send,
        F: FnMut(Settled<T>) + Send,
    {
        let started = tokio::time::Instant::now();
        let total = jobs.len();
        let batches = self.batch_count(total);
        let mut summary = RunSummary {
            total,
            batches,
            ..RunSummary::default()
        };
        let mut completed = 0;
        let mut pending = jobs.into_iter();

        for batch in 1..=batches {
            let mut in_flight: FuturesUnordered<_> = pending
                .by_ref()
                .take(self.batch_size)
                .map(move |(id, context)| async move {
                    let result = fetcher.fetch(account, &id).await;
                    (id, context, result)
                })
                .collect();

            tracing::debug!(batch, batches, size = in_flight.len(), "Starting batch");

            while let Some((id, context, result)) = in_flight.next().await {
                completed += 1;
                match &result {
                    Ok(_) => summary.succeeded += 1,
                    Err(e) => {
                        summary.failed += 1;
                        tracing::debug!(record_id = %id, error = %e, "Fetch settled with failure");
                    }
                }

                on_settled(Settled {
                    id,
                    context,
                    result,
                    completed,
                    total,
                });
            }

            if batch < batches || self.trailing_delay {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        summary.elapsed = started.elapsed();
        summary
    }
}
