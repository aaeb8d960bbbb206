//! Extraction session: runs, the record cache, and the display-mode toggle.
//!
//! An [`ExtractSession`] owns everything that lives longer than one run: the
//! configuration, the detail fetcher, the current [`DisplayMode`], the
//! [`RecordCache`] and the event channel. It is cheap to clone; clones share state.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::cache::{PendingRender, RecordCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{DetailFetcher, HttpDetailFetcher};
use crate::presenter::Presenter;
use crate::scheduler::{BatchScheduler, Settled};
use crate::source::{RecordSource, RenderTarget};
use crate::types::{AccountId, DisplayMode, Event, RawPayload, RecordId, RunSummary};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Mode and cache, always mutated together under one lock
#[derive(Debug)]
struct SessionState {
    mode: DisplayMode,
    cache: RecordCache,
}

/// Clears the in-progress flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Main extraction instance (cloneable - all fields are Arc-wrapped)
///
/// Render targets are called with no session state locked, so a target may read
/// [`mode`](Self::mode) or [`cached_len`](Self::cached_len) while rendering.
/// Deliveries are serialized, though: a target must not call
/// [`toggle_mode`](Self::toggle_mode) from inside `render`.
#[derive(Clone)]
pub struct ExtractSession {
    config: Arc<Config>,
    fetcher: Arc<dyn DetailFetcher>,
    scheduler: BatchScheduler,
    state: Arc<Mutex<SessionState>>,
    // Held from preparing a render until it is delivered, keeping deliveries in mode order
    delivery: Arc<Mutex<()>>,
    running: Arc<AtomicBool>,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl ExtractSession {
    /// Create a session fetching over HTTP as configured in `config.api`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpDetailFetcher::new(&config.api)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a session around a custom [`DetailFetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn DetailFetcher>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = SessionState {
            mode: config.presentation.initial_mode,
            cache: RecordCache::new(Presenter::from_config(&config.presentation)),
        };

        Ok(Self {
            scheduler: BatchScheduler::new(&config.batch),
            config: Arc::new(config),
            fetcher,
            state: Arc::new(Mutex::new(state)),
            delivery: Arc::new(Mutex::new(())),
            running: Arc::new(AtomicBool::new(false)),
            event_tx,
        })
    }

    /// Subscribe to session events
    ///
    /// Each subscriber receives every event sent after it subscribed.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this session was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current display mode
    pub fn mode(&self) -> DisplayMode {
        self.lock_state().mode
    }

    /// Number of records cached by the current (or last) run
    pub fn cached_len(&self) -> usize {
        self.lock_state().cache.len()
    }

    /// Copy of the cached payload of `id`
    pub fn cached_payload(&self, id: &RecordId) -> Option<RawPayload> {
        self.lock_state()
            .cache
            .get(id)
            .map(|entry| entry.payload.clone())
    }

    /// Whether a run is currently in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Fetch, cache and render every record listed by `source`
    ///
    /// The cache is cleared first. Individual fetch failures are logged and counted
    /// in the returned summary; they never fail the run.
    ///
    /// # Errors
    /// - [`Error::SourceUnavailable`] if the source has no account or no records
    /// - [`Error::RunInProgress`] if another run on this session has not finished
    pub async fn run(&self, source: &dyn RecordSource) -> Result<RunSummary> {
        let Some(account) = source
            .account()
            .map(|account| account.as_str().trim().to_string())
            .filter(|account| !account.is_empty())
            .map(AccountId::from)
        else {
            tracing::error!("Unable to find account id, not starting run");
            return Err(Error::SourceUnavailable {
                reason: "account id not found".to_string(),
            });
        };

        let records = source.records();
        if records.is_empty() {
            tracing::error!(account = %account, "No records listed, not starting run");
            return Err(Error::SourceUnavailable {
                reason: "no records listed".to_string(),
            });
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::RunInProgress);
        }
        let _guard = RunGuard(&self.running);

        let mut skipped = 0;
        let mut jobs: Vec<(RecordId, Weak<dyn RenderTarget>)> = Vec::with_capacity(records.len());
        for record in records {
            match record.usable_id() {
                Some(id) => jobs.push((id, record.target)),
                None => {
                    tracing::debug!("Skipping record without an identifier");
                    skipped += 1;
                }
            }
        }

        self.lock_state().cache.clear();

        let total = jobs.len();
        let batches = self.scheduler.batch_count(total);
        tracing::info!(account = %account, total, batches, skipped, "Starting extraction run");
        self.event_tx.send(Event::RunStarted { total, batches }).ok();

        let mut summary = self
            .scheduler
            .run(&account, jobs, self.fetcher.as_ref(), |settled| {
                self.settle(settled)
            })
            .await;
        summary.skipped = skipped;

        tracing::info!(
            account = %account,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Extraction run complete"
        );
        self.event_tx
            .send(Event::RunCompleted {
                summary: summary.clone(),
            })
            .ok();

        Ok(summary)
    }

    /// Flip the display mode and render every cached record again
    ///
    /// Returns the new mode. With nothing cached this only flips the mode.
    pub fn toggle_mode(&self) -> DisplayMode {
        let _delivery = lock(&self.delivery);
        let (mode, renders) = {
            let mut state = self.lock_state();
            state.mode = state.mode.toggled();
            (state.mode, state.cache.rerender_all(state.mode, Utc::now()))
        };
        let rerendered = renders.len();
        renders.into_iter().for_each(PendingRender::deliver);

        tracing::info!(%mode, rerendered, "Display mode changed");
        self.event_tx
            .send(Event::ModeChanged { mode, rerendered })
            .ok();
        mode
    }

    fn settle(&self, settled: Settled<Weak<dyn RenderTarget>>) {
        let Settled {
            id,
            context: target,
            result,
            completed,
            total,
        } = settled;

        match result {
            Ok(mut payload) => {
                payload.set_record_id(&id);
                let _delivery = lock(&self.delivery);
                let render = {
                    let mut state = self.lock_state();
                    let mode = state.mode;
                    state
                        .cache
                        .record(id.clone(), target, payload, mode, Utc::now())
                };
                if let Some(render) = render {
                    render.deliver();
                }
                self.event_tx.send(Event::RecordFetched { id }).ok();
            }
            Err(e) => {
                self.event_tx
                    .send(Event::RecordFailed {
                        id,
                        error: e.to_string(),
                    })
                    .ok();
            }
        }

        self.event_tx
            .send(Event::Progress { completed, total })
            .ok();
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }
}

// Poisoned only if a render target panicked mid-render
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for ExtractSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractSession")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
