//! JSON-over-HTTP transport with retry
//!
//! Shared by the upstream client and the relay client. Failed requests
//! are retried with quadratic backoff; 429 responses honour
//! `Retry-After` up to [`MAX_RETRY_AFTER_SECS`]. Non-idempotent requests
//! are only resent when the upstream cannot have acted on them: after a
//! 429 or when the connection was never established.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::GamificationError;

/// Longest `Retry-After` waited out before giving up with `RateLimited`
pub(crate) const MAX_RETRY_AFTER_SECS: u64 = 5;

pub(crate) struct HttpTransport {
    client: Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpTransport {
    pub(crate) fn new(
        base_url: &str,
        default_headers: HeaderMap,
        request_timeout_ms: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, GamificationError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
            backoff_base_ms,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document; 404 yields `None`
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<Option<T>, GamificationError> {
        let response = self
            .execute::<()>(Method::GET, path, query, None, headers)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        decode(response).await.map(Some)
    }

    /// Send a JSON body and decode the JSON reply; empty replies decode
    /// to `T::default()`
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<T, GamificationError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Default,
    {
        let response = self
            .execute(method, path, &[], Some(body), headers)
            .await?;
        let response = check_status(response).await?;
        decode_or_default(response).await
    }

    /// Send a JSON body, ignoring the reply body
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: &(impl Serialize + Sync),
        headers: HeaderMap,
    ) -> Result<(), GamificationError> {
        let response = self
            .execute(method, path, &[], Some(body), headers)
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Issue a request with retry logic.
    ///
    /// Returns the first response that is not a 429, including error
    /// statuses, so callers decide how to treat them.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<Response, GamificationError> {
        let url = self.url(path);
        let mut last_error = GamificationError::Unavailable;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Quadratic backoff: 1x, 4x, 9x the base delay
                let delay = self.backoff_base_ms * u64::from(attempt).pow(2);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    tracing::debug!(url = %url, attempt, "Rate limited by gamification API");
                    last_error = GamificationError::RateLimited;
                    match retry_after(&response) {
                        Some(secs) if secs > MAX_RETRY_AFTER_SECS => {
                            tracing::warn!(url = %url, retry_after = secs, "Retry-After too long, giving up");
                            break;
                        }
                        Some(secs) if attempt + 1 < self.max_retries => {
                            tokio::time::sleep(Duration::from_secs(secs)).await;
                        }
                        _ => {}
                    }
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "Gamification request failed");
                    let resendable = method.is_idempotent() || e.is_connect();
                    last_error = GamificationError::from_transport(e);
                    if !resendable {
                        // The upstream may already have recorded it
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

async fn check_status(response: Response) -> Result<Response, GamificationError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    Err(GamificationError::ApiError {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GamificationError> {
    let text = response.text().await.map_err(GamificationError::from_transport)?;
    serde_json::from_str(&text).map_err(|e| GamificationError::Decode(e.to_string()))
}

async fn decode_or_default<T: DeserializeOwned + Default>(
    response: Response,
) -> Result<T, GamificationError> {
    let text = response.text().await.map_err(GamificationError::from_transport)?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&text).map_err(|e| GamificationError::Decode(e.to_string()))
}
