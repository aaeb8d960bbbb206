//! Shared test doubles for the fetcher and render-target seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::FetchError;
use crate::fetcher::DetailFetcher;
use crate::source::RenderTarget;
use crate::types::{AccountId, Presentation, RawPayload, RecordId};

/// What the mock fetcher observed, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FetchLog {
    Started(RecordId),
    Finished(RecordId),
}

/// [`DetailFetcher`] with per-record canned outcomes and latency
#[derive(Default)]
pub(crate) struct MockFetcher {
    payloads: HashMap<RecordId, Value>,
    failures: HashMap<RecordId, u16>,
    delays: HashMap<RecordId, Duration>,
    log: Mutex<Vec<FetchLog>>,
    accounts: Mutex<HashSet<AccountId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Respond to `id` with HTTP `status`
    pub(crate) fn failing(mut self, id: &str, status: u16) -> Self {
        self.failures.insert(RecordId::from(id), status);
        self
    }

    /// Respond to `id` after `delay`
    pub(crate) fn delayed(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(RecordId::from(id), delay);
        self
    }

    /// Respond to `id` with this detail object instead of the default one
    pub(crate) fn with_payload(mut self, id: &str, payload: Value) -> Self {
        self.payloads.insert(RecordId::from(id), payload);
        self
    }

    pub(crate) fn log(&self) -> Vec<FetchLog> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn started(&self) -> Vec<RecordId> {
        self.log()
            .into_iter()
            .filter_map(|entry| match entry {
                FetchLog::Started(id) => Some(id),
                FetchLog::Finished(_) => None,
            })
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn accounts(&self) -> HashSet<AccountId> {
        self.accounts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DetailFetcher for MockFetcher {
    async fn fetch(&self, account: &AccountId, id: &RecordId) -> Result<RawPayload, FetchError> {
        self.accounts.lock().unwrap().insert(account.clone());
        self.log.lock().unwrap().push(FetchLog::Started(id.clone()));
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(FetchLog::Finished(id.clone()));

        if let Some(status) = self.failures.get(id) {
            return Err(FetchError::Status { status: *status });
        }

        let detail = self.payloads.get(id).cloned().unwrap_or_else(|| {
            json!({
                "createTime": "2024-01-01",
                "timeStamp": "2024-01-03T10:00:00",
                "Note": {"timeStamp": "2024-01-02T09:00:00"}
            })
        });
        RawPayload::from_envelope(json!({ "Order": detail }), "Order")
    }
}

/// [`RenderTarget`] keeping every presentation it was handed
#[derive(Default)]
pub(crate) struct RecordingTarget {
    renders: Mutex<Vec<Presentation>>,
}

impl RecordingTarget {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn last(&self) -> Option<Presentation> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub(crate) fn count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

impl RenderTarget for RecordingTarget {
    fn render(&self, presentation: &Presentation) {
        self.renders.lock().unwrap().push(presentation.clone());
    }
}

/// Type-erased weak handle to a recording target
pub(crate) fn weak_target(target: &Arc<RecordingTarget>) -> Weak<dyn RenderTarget> {
    let target: Arc<dyn RenderTarget> = target.clone();
    Arc::downgrade(&target)
}

/// Type-erased strong handle to a recording target
pub(crate) fn dyn_target(target: &Arc<RecordingTarget>) -> Arc<dyn RenderTarget> {
    target.clone()
}

pub(crate) fn ids(raw: &[&str]) -> Vec<RecordId> {
    raw.iter().map(|id| RecordId::from(*id)).collect()
}
