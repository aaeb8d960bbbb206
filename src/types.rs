//! Core types for po-extract

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::FetchError;

/// Identifier of a record (purchase order) within a run
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account the records belong to; part of every detail request path
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create a new AccountId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How date-bearing fields are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// `DD/MM/YYYY` in local calendar terms (default)
    #[default]
    Formatted,
    /// The API's original string, unchanged
    Raw,
}

impl DisplayMode {
    /// The other mode
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Formatted => DisplayMode::Raw,
            DisplayMode::Raw => DisplayMode::Formatted,
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Formatted => f.write_str("formatted"),
            DisplayMode::Raw => f.write_str("raw"),
        }
    }
}

/// Age classification of a record, relative to its creation time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeClass {
    /// Created within the stale threshold
    Fresh,
    /// Created longer ago than the stale threshold
    Stale,
}

/// Detail object returned by the API for one record, with the envelope removed
///
/// Only four fields are interpreted: `createTime`, `Note.timeStamp`, `timeStamp`
/// and the record identifier stamped in after the fetch. Everything else is
/// carried as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(Map<String, Value>);

impl RawPayload {
    /// Key under which the record identifier is stored after fetching
    pub const RECORD_ID_KEY: &'static str = "orderID";

    /// Wrap an already unwrapped detail object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Extract the detail object from a response envelope such as `{"Order": {...}}`
    pub fn from_envelope(envelope: Value, key: &str) -> Result<Self, FetchError> {
        match envelope {
            Value::Object(mut outer) => match outer.remove(key) {
                Some(Value::Object(inner)) => Ok(Self(inner)),
                _ => Err(FetchError::MissingEnvelope {
                    key: key.to_string(),
                }),
            },
            _ => Err(FetchError::MissingEnvelope {
                key: key.to_string(),
            }),
        }
    }

    /// Creation timestamp (`createTime`)
    pub fn create_time(&self) -> Option<&str> {
        self.0.get("createTime").and_then(Value::as_str)
    }

    /// Nested note timestamp (`Note.timeStamp`), used as the received date
    pub fn note_timestamp(&self) -> Option<&str> {
        self.0
            .get("Note")
            .and_then(|note| note.get("timeStamp"))
            .and_then(Value::as_str)
    }

    /// Top-level last-modified timestamp (`timeStamp`)
    pub fn timestamp(&self) -> Option<&str> {
        self.0.get("timeStamp").and_then(Value::as_str)
    }

    /// Identifier stamped in by [`RawPayload::set_record_id`]
    pub fn record_id(&self) -> Option<&str> {
        self.0.get(Self::RECORD_ID_KEY).and_then(Value::as_str)
    }

    /// Stamp the identifier the payload was fetched for
    pub fn set_record_id(&mut self, id: &RecordId) {
        self.0.insert(
            Self::RECORD_ID_KEY.to_string(),
            Value::String(id.0.clone()),
        );
    }

    /// All fields of the detail object
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Display strings and classification derived from one payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    /// Record the fields were derived from
    pub record_id: RecordId,
    /// Rendered `createTime`
    pub create_time: String,
    /// Rendered `createTime` again (the ordered-date column mirrors the create time)
    pub ordered_date: String,
    /// Rendered `Note.timeStamp`
    pub received_date: String,
    /// Rendered top-level `timeStamp`
    pub timestamp: String,
    /// Classification from `createTime`, independent of display mode
    pub age_class: AgeClass,
}

impl Presentation {
    /// Column labels for the four derived strings, in field order
    pub const HEADERS: [&'static str; 4] =
        ["Create Time", "Ordered Date", "Received Date", "Timestamp"];

    /// The four derived strings, in [`Presentation::HEADERS`] order
    pub fn columns(&self) -> [&str; 4] {
        [
            &self.create_time,
            &self.ordered_date,
            &self.received_date,
            &self.timestamp,
        ]
    }
}

/// Outcome counts of a completed run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records attempted (blank identifiers excluded)
    pub total: usize,
    /// Records fetched and cached
    pub succeeded: usize,
    /// Records whose fetch failed
    pub failed: usize,
    /// Source records skipped for lacking an identifier
    pub skipped: usize,
    /// Number of batches the records were split into
    pub batches: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of settled attempts (always `total` once a run completes)
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Event emitted during an extraction session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run started; the cache has been cleared
    RunStarted {
        /// Records to attempt
        total: usize,
        /// Batches the records were split into
        batches: usize,
    },

    /// One more fetch attempt settled
    Progress {
        /// Attempts settled so far in this run
        completed: usize,
        /// Records to attempt in this run
        total: usize,
    },

    /// A record was fetched, cached and rendered
    RecordFetched {
        /// Record identifier
        id: RecordId,
    },

    /// A record's fetch failed; it has no cache entry
    RecordFailed {
        /// Record identifier
        id: RecordId,
        /// Error message
        error: String,
    },

    /// Every record has been attempted
    RunCompleted {
        /// Outcome counts
        summary: RunSummary,
    },

    /// The display mode changed and cached records were re-rendered
    ModeChanged {
        /// The new mode
        mode: DisplayMode,
        /// Number of cached records rendered again
        rerendered: usize,
    },
}
