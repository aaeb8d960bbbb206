//! Common test utilities for po-extract integration tests

#![allow(dead_code)]

use po_extract::{
    AccountId, Config, Event, ExtractSession, Presentation, RenderTarget, SourceRecord,
    StaticSource,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Account every test listing belongs to
pub const ACCOUNT: &str = "12";

/// Stand-in for one row of the listing, remembering what it was shown
#[derive(Default)]
pub struct Row {
    renders: Mutex<Vec<Presentation>>,
}

impl Row {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last(&self) -> Option<Presentation> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

impl RenderTarget for Row {
    fn render(&self, presentation: &Presentation) {
        self.renders.lock().unwrap().push(presentation.clone());
    }
}

/// Config pointing at `server`, with short pacing so tests stay fast
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/API/Account", server.uri());
    config.api.request_timeout = Duration::from_secs(5);
    config.batch.inter_batch_delay = Duration::from_millis(20);
    config
}

pub fn session_for(server: &MockServer, batch_size: usize) -> ExtractSession {
    let mut config = config_for(server);
    config.batch.batch_size = batch_size;
    ExtractSession::new(config).unwrap()
}

/// Listing with one row per id, rows returned in the same order
pub fn listing(ids: &[&str]) -> (StaticSource, Vec<Arc<Row>>) {
    let mut source = StaticSource::new(Some(AccountId::from(ACCOUNT)));
    let mut rows = Vec::new();
    for id in ids {
        let row = Row::new();
        let target: Arc<dyn RenderTarget> = row.clone();
        source.push(SourceRecord::new(*id, &target));
        rows.push(row);
    }
    (source, rows)
}

/// A plausible order detail object
pub fn order_detail(id: &str, create_time: &str) -> Value {
    json!({
        "orderID": id,
        "createTime": create_time,
        "timeStamp": "2024-01-03T10:00:00+00:00",
        "Note": {"noteID": "7", "timeStamp": "2024-01-02T09:00:00+00:00"}
    })
}

/// Serve `detail` for `id`, wrapped in the order envelope
pub async fn mount_order(server: &MockServer, id: &str, detail: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/API/Account/{ACCOUNT}/Order/{id}.json")))
        .and(query_param("load_relations", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Order": detail })))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer requests for `id` with `status`
pub async fn mount_failure(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/API/Account/{ACCOUNT}/Order/{id}.json")))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// Every event already queued on `rx`
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
