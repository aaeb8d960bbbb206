//! Configuration types for po-extract

use crate::error::{Error, Result};
use crate::types::DisplayMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Remote detail API settings
///
/// Requests are built as `<base_url>/<account>/<resource>/<record>.json`, with an
/// optional `load_relations` query parameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL up to and including the account collection
    /// (default: "https://us.merchantos.com/API/Account")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Resource collection under the account (default: "Order")
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Key of the object wrapping the record in each response (default: "Order")
    #[serde(default = "default_envelope_key")]
    pub envelope_key: String,

    /// Value for the `load_relations` query parameter (default: "all", None = omitted)
    #[serde(default = "default_load_relations")]
    pub load_relations: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_millis_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resource: default_resource(),
            envelope_key: default_envelope_key(),
            load_relations: default_load_relations(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Batch pacing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of records fetched concurrently per batch (default: 10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after each batch settles (default: 500ms)
    #[serde(default = "default_inter_batch_delay", with = "duration_millis_serde")]
    pub inter_batch_delay: Duration,

    /// Also pause after the final batch (default: true)
    ///
    /// Disabling this shaves one `inter_batch_delay` off every run.
    #[serde(default = "default_true")]
    pub trailing_delay: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_batch_delay: default_inter_batch_delay(),
            trailing_delay: true,
        }
    }
}

/// Presentation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Records created more than this many days ago are stale (default: 180)
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: f64,

    /// Display mode a new session starts in (default: formatted)
    #[serde(default)]
    pub initial_mode: DisplayMode,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
            initial_mode: DisplayMode::default(),
        }
    }
}

/// Main configuration for [`ExtractSession`](crate::ExtractSession)
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote detail API
    #[serde(default)]
    pub api: ApiConfig,

    /// Batch pacing
    #[serde(default)]
    pub batch: BatchConfig,

    /// Field formatting and age classification
    #[serde(default)]
    pub presentation: PresentationConfig,
}

impl Config {
    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that would otherwise fail at run time
    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            return Err(Error::config(
                "batch.batch_size",
                "batch size must be greater than zero",
            ));
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(Error::config(
                "api.base_url",
                format!("'{}' is not an absolute URL", self.api.base_url),
            ));
        }

        if self.api.resource.trim().is_empty() {
            return Err(Error::config("api.resource", "resource must not be empty"));
        }

        if self.api.envelope_key.is_empty() {
            return Err(Error::config(
                "api.envelope_key",
                "envelope key must not be empty",
            ));
        }

        if !self.presentation.stale_after_days.is_finite()
            || self.presentation.stale_after_days < 0.0
        {
            return Err(Error::config(
                "presentation.stale_after_days",
                "stale threshold must be a non-negative number of days",
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://us.merchantos.com/API/Account".to_string()
}

fn default_resource() -> String {
    "Order".to_string()
}

fn default_envelope_key() -> String {
    "Order".to_string()
}

fn default_load_relations() -> Option<String> {
    Some("all".to_string())
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("po-extract/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_inter_batch_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_stale_after_days() -> f64 {
    180.0
}

fn default_true() -> bool {
    true
}

// Durations are written as whole milliseconds
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
