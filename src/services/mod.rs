pub mod enrichment;
pub mod lexical;
pub mod speech;
pub mod text_generation;
pub mod transcription;

use std::time::Duration;

use thiserror::Error;

/// Bounded retry policy shared by every provider client: transient failures
/// (network errors, 5xx, 408, 429) are retried with exponential backoff,
/// everything else is terminal.
pub(crate) const MAX_RETRIES: usize = 2;
pub(crate) const BASE_BACKOFF_MS: u64 = 200;
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    Empty,
}

pub(crate) fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

pub(crate) fn backoff(retry: usize) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS * (1 << retry))
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_are_retryable() {
        for code in [500u16, 502, 503, 408, 429] {
            assert!(is_retryable(reqwest::StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn terminal_statuses_are_not_retryable() {
        for code in [400u16, 401, 403, 404, 422] {
            assert!(!is_retryable(reqwest::StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn backoff_doubles_per_retry() {
        assert_eq!(backoff(0), Duration::from_millis(BASE_BACKOFF_MS));
        assert_eq!(backoff(1), Duration::from_millis(BASE_BACKOFF_MS * 2));
        assert_eq!(backoff(2), Duration::from_millis(BASE_BACKOFF_MS * 4));
    }
}
