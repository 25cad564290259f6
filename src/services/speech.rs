use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::sleep;
use tracing::warn;

use crate::services::{
    backoff, env_string, env_u64, is_retryable, ProviderError, DEFAULT_TIMEOUT_MS, MAX_RETRIES,
};

const DEFAULT_API_ENDPOINT: &str = "https://translate.google.com/translate_tts";
const DEFAULT_LANGUAGE: &str = "en";

#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Synthesizes the text to MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError>;
}

/// Translate-TTS HTTP client.
#[derive(Clone)]
pub struct HttpSpeechClient {
    endpoint: String,
    language: String,
    client: reqwest::Client,
}

impl HttpSpeechClient {
    pub fn from_env() -> Self {
        let endpoint =
            env_string("TTS_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        let language = env_string("TTS_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let timeout = Duration::from_millis(env_u64("TTS_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { endpoint, language, client }
    }
}

#[async_trait]
impl SpeechClient for HttpSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}",
            self.endpoint,
            self.language,
            urlencoding::encode(text)
        );

        let mut last_error: Option<ProviderError> = None;

        for retry in 0..=MAX_RETRIES {
            match self.client.get(&url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        if bytes.is_empty() {
                            return Err(ProviderError::Empty);
                        }
                        return Ok(bytes);
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = ProviderError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        warn!(retry, ?status, "TTS request failed, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = ProviderError::Request(e);
                    if retry < MAX_RETRIES {
                        warn!(retry, "TTS request error, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_error.unwrap_or(ProviderError::Empty))
    }
}
