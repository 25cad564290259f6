use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

use crate::services::{
    backoff, env_string, env_u64, is_retryable, ProviderError, DEFAULT_TIMEOUT_MS, MAX_RETRIES,
};

const DEFAULT_API_ENDPOINT: &str = "https://wordnet-api.example.com/synsets";

/// One sense group of a word, WordNet-style: a set of lemmas, each with the
/// antonyms reported for that lemma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synset {
    pub lemmas: Vec<Lemma>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lemma {
    pub name: String,
    #[serde(default)]
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalRelations {
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
}

#[async_trait]
pub trait LexicalClient: Send + Sync {
    /// All sense groups known for the word. Empty is valid.
    async fn synsets(&self, word: &str) -> Result<Vec<Synset>, ProviderError>;
}

/// Collapses synsets into synonym/antonym sets: synonyms are the deduplicated
/// union of all lemma names (case-sensitive); for antonyms, each lemma with
/// at least one antonym contributes only its first, then the result is
/// deduplicated. Both sets are unordered; insertion order is kept for
/// determinism.
pub fn resolve_relations(synsets: &[Synset]) -> LexicalRelations {
    let mut synonyms: Vec<String> = Vec::new();
    let mut antonyms: Vec<String> = Vec::new();

    for synset in synsets {
        for lemma in &synset.lemmas {
            if !synonyms.iter().any(|s| s == &lemma.name) {
                synonyms.push(lemma.name.clone());
            }
            if let Some(first) = lemma.antonyms.first() {
                if !antonyms.iter().any(|a| a == first) {
                    antonyms.push(first.clone());
                }
            }
        }
    }

    LexicalRelations { synonyms, antonyms }
}

#[derive(Clone)]
pub struct HttpLexicalClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpLexicalClient {
    pub fn from_env() -> Self {
        let endpoint = env_string("WORDNET_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        let timeout =
            Duration::from_millis(env_u64("WORDNET_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { endpoint, client }
    }
}

#[async_trait]
impl LexicalClient for HttpLexicalClient {
    async fn synsets(&self, word: &str) -> Result<Vec<Synset>, ProviderError> {
        let url = format!("{}?word={}", self.endpoint, urlencoding::encode(word));

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
                        warn!(retry, ?status, "wordnet request failed, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = ProviderError::Request(e);
                    if retry < MAX_RETRIES {
                        warn!(retry, "wordnet request error, retrying");
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
