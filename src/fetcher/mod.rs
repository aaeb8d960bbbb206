//! Detail fetching: one HTTP request per record.
//!
//! [`DetailFetcher`] is the seam between the scheduler and the network, so tests
//! can substitute canned responses. [`HttpDetailFetcher`] is the production
//! implementation on top of `reqwest`.

use serde_json::Value;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::{AccountId, RawPayload, RecordId};

/// Retrieves the detail payload of one record
#[async_trait::async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Fetch the unwrapped detail object of `id` within `account`
    async fn fetch(
        &self,
        account: &AccountId,
        id: &RecordId,
    ) -> std::result::Result<RawPayload, FetchError>;
}

/// [`DetailFetcher`] issuing `GET <base>/<account>/<resource>/<id>.json` requests
#[derive(Clone, Debug)]
pub struct HttpDetailFetcher {
    client: reqwest::Client,
    base_url: Url,
    resource: String,
    envelope_key: String,
    load_relations: Option<String>,
}

impl HttpDetailFetcher {
    /// Build a fetcher with its own HTTP client
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Self::with_client(client, config)
    }

    /// Build a fetcher around an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::config(
                "api.base_url",
                format!("invalid base URL '{}': {}", config.base_url, e),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(
                "api.base_url",
                format!("'{}' cannot carry a path", config.base_url),
            ));
        }

        Ok(Self {
            client,
            base_url,
            resource: config.resource.clone(),
            envelope_key: config.envelope_key.clone(),
            load_relations: config.load_relations.clone(),
        })
    }

    /// URL of the detail resource of `id`; path segments are percent-encoded
    pub fn detail_url(
        &self,
        account: &AccountId,
        id: &RecordId,
    ) -> std::result::Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| FetchError::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .push(account.as_str())
                .push(&self.resource)
                .push(&format!("{}.json", id));
        }

        if let Some(relations) = &self.load_relations {
            url.query_pairs_mut()
                .append_pair("load_relations", relations);
        }

        Ok(url)
    }

    async fn request(
        &self,
        account: &AccountId,
        id: &RecordId,
    ) -> std::result::Result<RawPayload, FetchError> {
        let url = self.detail_url(account, id)?;
        tracing::debug!(record_id = %id, %url, "Fetching record detail");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope: Value = serde_json::from_slice(&body)?;
        RawPayload::from_envelope(envelope, &self.envelope_key)
    }
}

#[async_trait::async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch(
        &self,
        account: &AccountId,
        id: &RecordId,
    ) -> std::result::Result<RawPayload, FetchError> {
        let result = self.request(account, id).await;
        if let Err(e) = &result {
            tracing::warn!(
                account = %account,
                record_id = %id,
                kind = e.kind(),
                error = %e,
                "Failed to fetch record detail"
            );
        }
        result
    }
}
