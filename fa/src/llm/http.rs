//! Shared POST-with-retry loop for HTTP inference backends

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

use super::LlmError;

/// Initial backoff delay for retries; doubles on every attempt
const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on a server-requested `retry-after` wait
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// POST a JSON body, retrying transient failures
///
/// Waits for the server's `retry-after` on 429 (capped), otherwise backs off
/// exponentially. Errors that `LlmError::is_retryable` rejects return at once.
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<Response, LlmError> {
    debug!(%url, max_retries, "post_json: called");
    let mut attempt = 0;

    loop {
        let error = match send_once(http, url, headers, body).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= max_retries {
            debug!(attempt, error = %error, "post_json: giving up");
            return Err(error);
        }

        let wait = error
            .retry_after()
            .map(|d| d.min(MAX_RETRY_AFTER))
            .unwrap_or_else(|| Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt)));
        attempt += 1;
        warn!(attempt, wait_ms = wait.as_millis() as u64, error = %error, "post_json: retrying after transient error");
        tokio::time::sleep(wait).await;
    }
}

/// One request; every non-2xx status becomes an `LlmError`
async fn send_once(
    http: &Client,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
) -> Result<Response, LlmError> {
    let mut builder = http.post(url).header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }

    let response = builder.json(body).send().await?;
    let status = response.status().as_u16();

    if response.status().is_success() {
        debug!(status, "send_once: success");
        return Ok(response);
    }

    if status == 401 || status == 403 {
        let text = response.text().await.unwrap_or_default();
        return Err(LlmError::Auth(format!("HTTP {}: {}", status, text)));
    }

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        debug!(?retry_after, "send_once: rate limited (429)");
        return Err(LlmError::RateLimited { retry_after });
    }

    let text = response.text().await.unwrap_or_default();
    debug!(status, "send_once: API error");
    Err(LlmError::ApiError { status, message: text })
}
