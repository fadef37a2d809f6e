use crate::schemas::listings_response::ListingsResponse;
use crate::settings::{ApiSettings, RetrySettings};
use chrono::Utc;
use http::header::{COOKIE, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialFactorBackoff};
use tokio_retry2::{Retry, RetryError};

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request never got a response.
    Transport { kind: &'static str, message: String },
    /// 401/403: the session cookie is missing or no longer valid.
    Unauthorized { status: u16, body: String },
    RateLimited { retry_after_secs: u64 },
    Server { status: u16, body: String },
    Client { status: u16, body: String },
    /// 2xx, but the body is not JSON.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport { kind, message } => {
                write!(f, "Request error ({}): {}", kind, message)
            }
            FetchError::Unauthorized { status, body } => {
                write!(f, "Authentication error ({}): {}", status, body)
            }
            FetchError::RateLimited { retry_after_secs } => write!(
                f,
                "Rate limit exceeded (retry after {}s)",
                retry_after_secs
            ),
            FetchError::Server { status, body } => {
                write!(f, "Server error ({}): {}", status, body)
            }
            FetchError::Client { status, body } => {
                write!(f, "Client error ({}): {}", status, body)
            }
            FetchError::Decode(message) => write!(f, "JSON parsing error: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Clone)]
pub struct ListingsClient {
    inner: Arc<Client>,
}

impl ListingsClient {
    pub fn new(api: &ApiSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(client),
        })
    }
}

/// Fetches the investor requisition listings and parses the body as JSON.
///
/// Timeouts, connection failures, 5xx and 429 are retried with exponential
/// backoff; every other failure is returned straight away.
pub async fn fetch_listings(
    client: &ListingsClient,
    api: &ApiSettings,
    retry: &RetrySettings,
) -> Result<ListingsResponse, FetchError> {
    let url = api.listings_url();
    let retry_strategy =
        ExponentialFactorBackoff::from_millis(retry.base_delay_ms, 2.0)
            .max_delay(Duration::from_secs(retry.max_delay_secs))
            .map(jitter)
            .take(retry.retry_attempts as usize);

    let attempt = AtomicU32::new(0);
    let started_at = Utc::now();

    let result = Retry::spawn(retry_strategy, || async {
        let current_attempt = attempt.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            "Listings request attempt {}/{} to {}",
            current_attempt + 1,
            retry.retry_attempts + 1,
            url
        );

        let mut request = client
            .inner
            .get(&url)
            .header(REFERER, &api.app_url)
            .header(COOKIE, &api.cookie);
        if let Some(user_agent) = &api.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let error_type = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection"
                } else {
                    "other"
                };

                tracing::warn!(
                    "Listings request failed on attempt {}: {} error - {}",
                    current_attempt + 1,
                    error_type,
                    e
                );

                let err = FetchError::Transport {
                    kind: error_type,
                    message: e.to_string(),
                };
                return if e.is_timeout() || e.is_connect() {
                    Err(RetryError::transient(err))
                } else {
                    Err(RetryError::permanent(err))
                };
            }
        };

        let status = response.status();
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error response body".to_string());

                tracing::error!(
                    "Listings request rejected with {}; a valid session cookie is required",
                    status
                );

                Err(RetryError::permanent(FetchError::Unauthorized {
                    status: status.as_u16(),
                    body: error_body,
                }))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let delay = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(2);

                tracing::warn!(
                    "Rate limit hit on attempt {}. Waiting {} seconds before retry",
                    current_attempt + 1,
                    delay
                );

                Err(RetryError::retry_after(
                    FetchError::RateLimited {
                        retry_after_secs: delay,
                    },
                    Duration::from_secs(delay),
                ))
            }
            status if !status.is_success() => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP error: {}", status));

                tracing::warn!(
                    "Listings request failed with status {} on attempt {}: {}",
                    status,
                    current_attempt + 1,
                    error_body
                );

                if status.is_server_error() {
                    Err(RetryError::transient(FetchError::Server {
                        status: status.as_u16(),
                        body: error_body,
                    }))
                } else {
                    Err(RetryError::permanent(FetchError::Client {
                        status: status.as_u16(),
                        body: error_body,
                    }))
                }
            }
            _ => match response.json::<Value>().await {
                Ok(body) => Ok((body, current_attempt)),
                Err(e) => Err(RetryError::permanent(FetchError::Decode(e.to_string()))),
            },
        }
    })
    .await;

    match result {
        Ok((body, current_attempt)) => {
            let fetched_at = Utc::now();
            Ok(ListingsResponse {
                body,
                attempt: current_attempt,
                fetched_at,
                elapsed_ms: fetched_at
                    .signed_duration_since(started_at)
                    .num_milliseconds(),
            })
        }
        Err(e) => {
            tracing::error!(
                "Listings request failed after {} attempt(s). Final error: {}",
                attempt.load(Ordering::SeqCst),
                e
            );
            Err(e)
        }
    }
}
