//! HTTP client for the song metadata source.
//!
//! # Status Mapping
//!
//! | Response | Result |
//! |----------|--------|
//! | transport error / timeout | retried, then `Error::Upstream` |
//! | 400 | `Error::UnknownSong` (no retry) |
//! | 500 | `Error::Upstream` (no retry) |
//! | anything else | body decoded as [`SongInfoPayload`] |
//!
//! Requests made while serving an API call carry its `x-request-id`.

use super::{RetryPolicy, SongDetails, SongInfoPayload, SongInfoProvider};
use crate::config::EnrichmentConfig;
use crate::observability::{REQUEST_ID_HEADER, current_request_id};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Client for `GET <endpoint>?group=<g>&song=<s>`.
#[derive(Debug, Clone)]
pub struct HttpSongInfoClient {
    /// Pooled HTTP client.
    client: reqwest::Client,
    /// Metadata endpoint URL.
    endpoint: String,
    /// Attempt and timeout bounds.
    retry: RetryPolicy,
}

impl HttpSongInfoClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("music-library/{}", env!("CARGO_PKG_VERSION")))
            .timeout(retry.attempt_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| Error::operation("song_info_client_build", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    /// Creates a client from the enrichment section of the configuration.
    ///
    /// Returns `Ok(None)` when no endpoint is configured.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Option<Self>> {
        config
            .url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.retry_policy()))
            .transpose()
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SongInfoProvider for HttpSongInfoClient {
    async fn fetch(&self, group: &str, song: &str) -> Result<SongDetails> {
        tracing::debug!(endpoint = %self.endpoint, group, song, "Requesting song details");
        let request_id = current_request_id();

        // Form encoding turns spaces into '+'.
        let response = self
            .retry
            .run("song_info_fetch", |attempt| {
                tracing::trace!(attempt, "Sending song details request");
                let mut request = self
                    .client
                    .get(&self.endpoint)
                    .query(&[("group", group), ("song", song)]);
                if let Some(id) = request_id.as_deref() {
                    request = request.header(REQUEST_ID_HEADER, id);
                }
                request.send()
            })
            .await
            .map_err(|e| Error::Upstream {
                cause: e.to_string(),
            })?;

        match response.status() {
            StatusCode::BAD_REQUEST => {
                tracing::info!(group, song, "Metadata source does not know the song");
                Err(Error::UnknownSong {
                    group: group.to_string(),
                    song: song.to_string(),
                })
            },
            StatusCode::INTERNAL_SERVER_ERROR => Err(Error::Upstream {
                cause: "metadata source answered 500".to_string(),
            }),
            status => {
                let payload: SongInfoPayload =
                    response.json().await.map_err(|e| Error::Upstream {
                        cause: format!("invalid response body (status {status}): {e}"),
                    })?;
                Ok(payload.into())
            },
        }
    }
}
