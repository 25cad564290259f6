use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::warn;

use crate::services::{
    backoff, env_string, env_u64, is_retryable, ProviderError, DEFAULT_TIMEOUT_MS, MAX_RETRIES,
};

const DEFAULT_API_ENDPOINT: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// IPA transcription for the word, e.g. `/ˈæp.əl/`.
    async fn transcribe(&self, word: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<Phonetic>,
}

#[derive(Debug, Deserialize)]
struct Phonetic {
    text: Option<String>,
}

#[derive(Clone)]
pub struct HttpTranscriptionClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTranscriptionClient {
    pub fn from_env() -> Self {
        let endpoint = env_string("DICTIONARY_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        let timeout =
            Duration::from_millis(env_u64("DICTIONARY_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { endpoint, client }
    }

    async fn fetch_entries(&self, word: &str) -> Result<Vec<DictionaryEntry>, ProviderError> {
        let url = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(word)
        );

        let mut last_error: Option<ProviderError> = None;

        for retry in 0..=MAX_RETRIES {
            match self.client.get(&url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        return serde_json::from_slice(&bytes).map_err(ProviderError::Json);
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = ProviderError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        warn!(retry, ?status, "dictionary request failed, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = ProviderError::Request(e);
                    if retry < MAX_RETRIES {
                        warn!(retry, "dictionary request error, retrying");
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

#[async_trait]
impl TranscriptionClient for HttpTranscriptionClient {
    async fn transcribe(&self, word: &str) -> Result<String, ProviderError> {
        let entries = self.fetch_entries(word).await?;
        first_transcription(&entries).ok_or(ProviderError::Empty)
    }
}

fn first_transcription(entries: &[DictionaryEntry]) -> Option<String> {
    for entry in entries {
        if let Some(text) = entry.phonetic.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(text.trim().to_string());
        }
        for phonetic in &entry.phonetics {
            if let Some(text) = phonetic.text.as_deref().filter(|t| !t.trim().is_empty()) {
                return Some(text.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_top_level_phonetic() {
        let entries: Vec<DictionaryEntry> = serde_json::from_str(
            r#"[{"phonetic": "/ˈæp.əl/", "phonetics": [{"text": "/x/"}]}]"#,
        )
        .unwrap();
        assert_eq!(first_transcription(&entries).as_deref(), Some("/ˈæp.əl/"));
    }

    #[test]
    fn falls_back_to_phonetics_list() {
        let entries: Vec<DictionaryEntry> = serde_json::from_str(
            r#"[{"phonetics": [{"text": null}, {"text": "/ˈwɔː.tə/"}]}]"#,
        )
        .unwrap();
        assert_eq!(first_transcription(&entries).as_deref(), Some("/ˈwɔː.tə/"));
    }

    #[test]
    fn empty_entries_yield_none() {
        assert!(first_transcription(&[]).is_none());
    }
}
