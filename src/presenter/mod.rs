//! Derivation of display fields from a fetched payload.
//!
//! The presenter is a pure function of the payload, the [`DisplayMode`] and the
//! instant of rendering. It is called when a record is first fetched and again for
//! every cached record whenever the mode changes.
//!
//! Date strings are read in three shapes:
//! - RFC 3339 with an offset (`2024-01-01T09:30:00+00:00`), converted to local time
//! - a naive date-time (`2024-01-01T09:30:00`), taken as local time
//! - a bare calendar date (`2024-01-01`), taken as that local calendar day
//!
//! Anything else is shown unchanged, even in formatted mode.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::config::PresentationConfig;
use crate::types::{AgeClass, DisplayMode, Presentation, RawPayload, RecordId};

/// Milliseconds in one day, used for fractional day arithmetic
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Renders payloads into [`Presentation`]s
#[derive(Clone, Debug)]
pub struct Presenter {
    stale_after_days: f64,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::from_config(&PresentationConfig::default())
    }
}

impl Presenter {
    /// Create a presenter with the given stale threshold in days
    pub fn new(stale_after_days: f64) -> Self {
        Self { stale_after_days }
    }

    /// Create a presenter from the presentation settings
    pub fn from_config(config: &PresentationConfig) -> Self {
        Self::new(config.stale_after_days)
    }

    /// Stale threshold in days
    pub fn stale_after_days(&self) -> f64 {
        self.stale_after_days
    }

    /// Derive the display fields of `payload` under `mode`, classifying age relative to `now`
    pub fn render(
        &self,
        id: &RecordId,
        payload: &RawPayload,
        mode: DisplayMode,
        now: DateTime<Utc>,
    ) -> Presentation {
        let create_time = render_field(payload.create_time(), mode);

        Presentation {
            record_id: id.clone(),
            ordered_date: create_time.clone(),
            create_time,
            received_date: render_field(payload.note_timestamp(), mode),
            timestamp: render_field(payload.timestamp(), mode),
            age_class: self.classify_age(payload.create_time(), now),
        }
    }

    /// Classify a creation timestamp as stale or fresh relative to `now`
    ///
    /// Stale only when strictly more than the threshold has elapsed; fractional days
    /// count. A missing or unreadable timestamp is fresh.
    pub fn classify_age(&self, create_time: Option<&str>, now: DateTime<Utc>) -> AgeClass {
        let Some(created) = create_time.and_then(parse_instant) else {
            return AgeClass::Fresh;
        };

        let elapsed_days = (now - created).num_milliseconds() as f64 / MILLIS_PER_DAY;
        if elapsed_days > self.stale_after_days {
            AgeClass::Stale
        } else {
            AgeClass::Fresh
        }
    }
}

fn render_field(value: Option<&str>, mode: DisplayMode) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match mode {
        DisplayMode::Raw => value.to_string(),
        DisplayMode::Formatted => format_date(value).unwrap_or_else(|| {
            tracing::debug!(value, "Unrecognised date, showing it unformatted");
            value.to_string()
        }),
    }
}

/// Format a date string as zero-padded `DD/MM/YYYY` in the local calendar
///
/// Returns `None` when the string is not in a recognised shape.
pub fn format_date(value: &str) -> Option<String> {
    local_date(value).map(|date| date.format("%d/%m/%Y").to_string())
}

fn local_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Local).date_naive());
    }
    if let Some(naive) = parse_naive_datetime(value) {
        return Some(naive.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    let naive = match parse_naive_datetime(value) {
        Some(naive) => naive,
        None => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
    };

    // Skipped local times (DST gaps) have no instant
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
