#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;

use anki_vocab_backend::db::Database;
use anki_vocab_backend::services::enrichment::CardEnricher;
use anki_vocab_backend::services::lexical::{Lemma, LexicalClient, Synset};
use anki_vocab_backend::services::speech::SpeechClient;
use anki_vocab_backend::services::text_generation::TextGenerator;
use anki_vocab_backend::services::transcription::TranscriptionClient;
use anki_vocab_backend::services::ProviderError;
use anki_vocab_backend::storage::FsAudioStore;

pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "sqlite::memory:");
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    std::env::set_var(
        "AUDIO_DIR",
        std::env::temp_dir().join("vocab-audio-test").display().to_string(),
    );

    anki_vocab_backend::create_app().await
}

pub struct MockTranscription {
    pub calls: AtomicUsize,
}

impl MockTranscription {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl TranscriptionClient for MockTranscription {
    async fn transcribe(&self, word: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("/{word}/"))
    }
}

pub struct MockLexical {
    pub calls: AtomicUsize,
    pub synsets: Vec<Synset>,
}

impl MockLexical {
    pub fn new(synsets: Vec<Synset>) -> Self {
        Self { calls: AtomicUsize::new(0), synsets }
    }

    pub fn with_default_synsets() -> Self {
        Self::new(vec![
            Synset {
                lemmas: vec![
                    Lemma { name: "crisp".into(), antonyms: vec!["soggy".into(), "limp".into()] },
                    Lemma { name: "fresh".into(), antonyms: vec!["stale".into()] },
                ],
            },
            Synset {
                lemmas: vec![
                    Lemma { name: "fresh".into(), antonyms: vec![] },
                    Lemma { name: "ripe".into(), antonyms: vec![] },
                ],
            },
        ])
    }
}

#[async_trait]
impl LexicalClient for MockLexical {
    async fn synsets(&self, _word: &str) -> Result<Vec<Synset>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.synsets.clone())
    }
}

/// Answers each prompt kind with a canned response and records every prompt,
/// so tests can assert which generation stages actually ran.
pub struct MockGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self { prompts: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let response = if prompt.contains("Define") {
            "A round fruit with firm flesh."
        } else if prompt.contains("Vietnamese meaning") {
            "quả táo"
        } else if prompt.contains("English example sentences") {
            "The apple is red.\nShe ate an apple for lunch."
        } else if prompt.contains("Vietnamese example sentences") {
            "Quả táo màu đỏ.\nCô ấy đã ăn một quả táo."
        } else if prompt.contains("part of speech") {
            "noun"
        } else if prompt.contains("word family") {
            "apple, applesauce, apple tree"
        } else {
            return Err(ProviderError::Empty);
        };
        Ok(response.to_string())
    }
}

pub struct MockSpeech {
    pub calls: AtomicUsize,
    pub fail_for: Option<String>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0), fail_for: None }
    }

    /// Fails (as if retries were already exhausted) whenever asked to
    /// synthesize exactly this text.
    pub fn failing_for(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: Some(text.to_string()),
        }
    }
}

#[async_trait]
impl SpeechClient for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(text) {
            return Err(ProviderError::HttpStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "synthesis backend down".into(),
            });
        }
        Ok(Bytes::from(format!("mp3:{text}").into_bytes()))
    }
}

pub struct Harness {
    pub db: Arc<Database>,
    pub audio: Arc<FsAudioStore>,
    pub transcription: Arc<MockTranscription>,
    pub lexical: Arc<MockLexical>,
    pub generator: Arc<MockGenerator>,
    pub speech: Arc<MockSpeech>,
    pub enricher: CardEnricher,
    _audio_dir: tempfile::TempDir,
}

pub async fn harness() -> Harness {
    harness_with(MockLexical::with_default_synsets(), MockSpeech::new()).await
}

pub async fn harness_with(lexical: MockLexical, speech: MockSpeech) -> Harness {
    let db = Arc::new(Database::connect("sqlite::memory:").await.unwrap());
    let audio_dir = tempfile::tempdir().unwrap();
    let audio = Arc::new(FsAudioStore::new(audio_dir.path()).unwrap());

    let transcription = Arc::new(MockTranscription::new());
    let lexical = Arc::new(lexical);
    let generator = Arc::new(MockGenerator::new());
    let speech = Arc::new(speech);

    let enricher = CardEnricher::new(
        Arc::clone(&db),
        audio.clone(),
        transcription.clone(),
        lexical.clone(),
        generator.clone(),
        speech.clone(),
    );

    Harness {
        db,
        audio,
        transcription,
        lexical,
        generator,
        speech,
        enricher,
        _audio_dir: audio_dir,
    }
}
