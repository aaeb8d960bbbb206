//! Host-side collaborators: where records come from and where they are shown.
//!
//! The host owns both the list of records and the display targets. The library
//! only ever holds a [`Weak`] reference to a target, so dropping a target on the
//! host side simply stops it from being rendered.

use std::sync::{Arc, Weak};

use crate::types::{AccountId, Presentation, RecordId};

/// Receives the derived fields of one record
///
/// `render` is called with no session state locked and may read from the
/// session, but it must not call [`ExtractSession::toggle_mode`](crate::ExtractSession::toggle_mode):
/// deliveries are serialized and that call would wait on itself.
pub trait RenderTarget: Send + Sync {
    /// Show `presentation`; called on first fetch and again on every mode change
    fn render(&self, presentation: &Presentation);
}

/// One record listed by a [`RecordSource`]
#[derive(Clone)]
pub struct SourceRecord {
    /// Identifier, if the host could find one for this record
    pub id: Option<RecordId>,
    /// Where the record's presentation goes
    pub target: Weak<dyn RenderTarget>,
}

impl SourceRecord {
    /// A record with an identifier
    pub fn new(id: impl Into<RecordId>, target: &Arc<dyn RenderTarget>) -> Self {
        Self {
            id: Some(id.into()),
            target: Arc::downgrade(target),
        }
    }

    /// A record the host could not find an identifier for
    pub fn without_id(target: &Arc<dyn RenderTarget>) -> Self {
        Self {
            id: None,
            target: Arc::downgrade(target),
        }
    }

    /// The identifier, if present and not blank
    pub fn usable_id(&self) -> Option<RecordId> {
        self.id
            .as_ref()
            .map(|id| id.as_str().trim())
            .filter(|id| !id.is_empty())
            .map(RecordId::from)
    }
}

impl std::fmt::Debug for SourceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRecord")
            .field("id", &self.id)
            .field("target_alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// Supplies the account context and the ordered records of one run
pub trait RecordSource: Send + Sync {
    /// Account the records belong to, if it can be determined
    fn account(&self) -> Option<AccountId>;

    /// Records in display order
    fn records(&self) -> Vec<SourceRecord>;
}

/// A [`RecordSource`] over a fixed list
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    account: Option<AccountId>,
    records: Vec<SourceRecord>,
}

impl StaticSource {
    /// Create a source for `account` with no records
    pub fn new(account: Option<AccountId>) -> Self {
        Self {
            account,
            records: Vec::new(),
        }
    }

    /// Append a record
    pub fn push(&mut self, record: SourceRecord) {
        self.records.push(record);
    }

    /// Builder form of [`StaticSource::push`]
    #[must_use]
    pub fn with_record(mut self, record: SourceRecord) -> Self {
        self.records.push(record);
        self
    }
}

impl RecordSource for StaticSource {
    fn account(&self) -> Option<AccountId> {
        self.account.clone()
    }

    fn records(&self) -> Vec<SourceRecord> {
        self.records.clone()
    }
}
