//! Shared HTTP plumbing for source adapters and enrichment providers.
//!
//! Every outbound client goes through [`build_client`]: connection pooling via
//! reqwest, retry middleware with jittered exponential backoff on transient
//! failures, and a shared status-to-error mapping in [`check_status`].

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// User agent sent with every request; some upstreams (GitHub) require one.
const USER_AGENT: &str = concat!("paper-digest/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with retry middleware and the given default headers.
///
/// # Errors
///
/// Returns error if client initialization fails.
pub fn build_client(config: &Config, headers: HeaderMap) -> anyhow::Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
        .build_with_max_retries(config.provider_max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Map response status codes to [`ClientError`].
///
/// # Errors
///
/// Returns the mapped error for any non-success status.
pub async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::rate_limited(retry_after))
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::not_found(text))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::bad_request(text))
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::server(status.as_u16(), text))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
        }
    }
}
