// src/services/http_fetch.rs
//! HTTP GET with exponential backoff.
//!
//! 4xx other than 429 comes back to the caller untouched (a 404 from the LY
//! API usually means "nothing for this legislator"). 429, 5xx and transport
//! errors are retried, doubling the delay each time, until the attempt budget
//! is spent.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchSettings;
use crate::errors::{AppError, Result};

const USER_AGENT: &str = "ly-fantasy/0.1 (+https://github.com/ly-fantasy)";

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()?;

        Ok(HttpFetcher {
            client,
            max_retries: settings.max_retries.max(1),
            initial_backoff: settings.initial_backoff,
        })
    }

    pub fn with_client(client: Client, max_retries: u32, initial_backoff: Duration) -> Self {
        HttpFetcher {
            client,
            max_retries: max_retries.max(1),
            initial_backoff,
        }
    }

    /// GET `url` with retry. Non-retryable client errors are returned as
    /// `Ok` so the caller can inspect the status.
    pub async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut backoff = self.initial_backoff;
        let mut last_reason = String::new();

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                debug!(url, attempt, "Retrying request");
            }

            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || is_non_retryable(status) {
                        return Ok(response);
                    }
                    last_reason = format!("HTTP {}", status.as_u16());
                }
                Err(e) => {
                    last_reason = e.to_string();
                }
            }

            if attempt < self.max_retries {
                warn!(
                    url,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    reason = %last_reason,
                    "Request failed, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(AppError::FetchExhausted {
            url: url.to_string(),
            attempts: self.max_retries,
            reason: last_reason,
        })
    }

    /// GET and decode JSON. A non-retryable client error yields `Ok(None)`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let response = self.get_with_retry(url, query).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Client error from feed");
            return Ok(None);
        }
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// GET a binary payload (spreadsheet download). Client errors are fatal
    /// here because there is no "empty" spreadsheet.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get_with_retry(url, &[]).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_api(format!(
                "download of {} returned HTTP {}",
                url,
                status.as_u16()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_non_retryable(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plain_client_errors_skip_retry() {
        assert!(is_non_retryable(StatusCode::NOT_FOUND));
        assert!(is_non_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_non_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_non_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_non_retryable(StatusCode::BAD_GATEWAY));
    }
}
