use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::db::cards::{self, AudioRefs, CardDraft, VocabularyCard};
use crate::db::{Database, StoreError};
use crate::services::lexical::{resolve_relations, LexicalClient, LexicalRelations};
use crate::services::speech::SpeechClient;
use crate::services::text_generation::TextGenerator;
use crate::services::transcription::TranscriptionClient;
use crate::services::ProviderError;
use crate::storage::{ArtifactError, AudioRole, AudioStore};

pub const EXAMPLE_SENTENCE_COUNT: usize = 2;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant for building vocabulary flashcards. \
     Answer with only what is asked, without preamble or explanations.";

/// Pipeline stage names, carried in failures so callers can tell which
/// provider broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcription,
    LexicalRelations,
    ExampleSentences,
    MeaningEn,
    MeaningVi,
    WordType,
    VocabFamily,
    AudioWord,
    AudioExample1,
    AudioExample2,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::LexicalRelations => "lexical_relations",
            Self::ExampleSentences => "example_sentences",
            Self::MeaningEn => "meaning_en",
            Self::MeaningVi => "meaning_vi",
            Self::WordType => "word_type",
            Self::VocabFamily => "vocab_family",
            Self::AudioWord => "audio_word",
            Self::AudioExample1 => "audio_example1",
            Self::AudioExample2 => "audio_example2",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{stage} stage failed: {source}")]
    ExternalService {
        stage: Stage,
        source: ProviderError,
    },
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
    #[error("artifact store failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("card not found")]
    NotFound,
}

impl EnrichmentError {
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::ExternalService { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn stage_err(stage: Stage) -> impl FnOnce(ProviderError) -> EnrichmentError {
    move |source| EnrichmentError::ExternalService { stage, source }
}

fn audio_stage(role: AudioRole) -> Stage {
    match role {
        AudioRole::Word => Stage::AudioWord,
        AudioRole::Example1 => Stage::AudioExample1,
        AudioRole::Example2 => Stage::AudioExample2,
    }
}

/// Caller-supplied fields. Any present field skips the corresponding
/// generation stage. Synonyms/antonyms are always computed from the word and
/// are deliberately absent here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOverrides {
    pub meaning_en: Option<String>,
    pub meaning_vi: Option<String>,
    pub ipa_transcription: Option<String>,
    pub example_sentences_en: Option<Vec<String>>,
    pub example_sentences_vi: Option<Vec<String>>,
    pub visual_image_url: Option<String>,
    pub word_type: Option<String>,
    pub vocab_family: Option<Vec<String>>,
}

/// The generation stages' output without persistence, for preview-before-save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentPreview {
    pub word: String,
    pub ipa_transcription: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub example_sentences_en: Vec<String>,
    pub example_sentences_vi: Vec<String>,
    pub meaning_en: String,
    pub meaning_vi: String,
    pub word_type: String,
    pub vocab_family: Vec<String>,
    pub audio_base64: String,
}

#[derive(Debug, Clone)]
struct GeneratedFields {
    ipa_transcription: String,
    relations: LexicalRelations,
    example_sentences_en: Vec<String>,
    example_sentences_vi: Vec<String>,
    meaning_en: String,
    meaning_vi: String,
    word_type: String,
    vocab_family: Vec<String>,
}

/// The enrichment orchestrator. Holds every collaborator as an injected
/// capability, so tests substitute doubles and nothing reaches for a global.
#[derive(Clone)]
pub struct CardEnricher {
    db: Arc<Database>,
    audio: Arc<dyn AudioStore>,
    transcription: Arc<dyn TranscriptionClient>,
    lexical: Arc<dyn LexicalClient>,
    generator: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechClient>,
}

impl CardEnricher {
    pub fn new(
        db: Arc<Database>,
        audio: Arc<dyn AudioStore>,
        transcription: Arc<dyn TranscriptionClient>,
        lexical: Arc<dyn LexicalClient>,
        generator: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechClient>,
    ) -> Self {
        Self {
            db,
            audio,
            transcription,
            lexical,
            generator,
            speech,
        }
    }

    /// Runs the whole pipeline: generation stages concurrently, skeleton
    /// insert to obtain the identity, audio synthesis keyed by that identity,
    /// then the artifact update. Any stage failure aborts with a typed error;
    /// a skeleton persisted before the failure stays behind with null audio
    /// fields and can be resumed by id.
    pub async fn create_card(
        &self,
        user_id: &str,
        dataset_id: &str,
        word: &str,
        overrides: &CardOverrides,
    ) -> Result<VocabularyCard, EnrichmentError> {
        if word.trim().is_empty() {
            return Err(EnrichmentError::Validation("word must not be empty".into()));
        }

        let fields = self.generate_fields(word, overrides).await?;

        let draft = CardDraft {
            user_id: user_id.to_string(),
            dataset_id: dataset_id.to_string(),
            word: word.to_string(),
            meaning_en: Some(fields.meaning_en),
            meaning_vi: Some(fields.meaning_vi),
            ipa_transcription: Some(fields.ipa_transcription),
            example_sentences_en: fields.example_sentences_en.clone(),
            example_sentences_vi: fields.example_sentences_vi,
            visual_image_url: overrides.visual_image_url.clone(),
            synonyms: fields.relations.synonyms,
            antonyms: fields.relations.antonyms,
            word_type: Some(fields.word_type),
            vocab_family: fields.vocab_family,
        };

        // Identity must exist before the artifacts keyed to it can be named.
        let id = cards::insert_skeleton(&self.db, &draft).await?;
        info!(card_id = %id, %word, "skeleton card persisted");

        let refs = self
            .synthesize_all(&id, word, &fields.example_sentences_en)
            .await?;
        cards::update_artifacts(&self.db, &id, &refs).await?;

        cards::find_by_id(&self.db, &id)
            .await?
            .ok_or(EnrichmentError::NotFound)
    }

    /// Same generation stages as `create_card` but with no persistence; the
    /// word audio comes back base64-encoded.
    pub async fn generate_preview(
        &self,
        word: &str,
        overrides: &CardOverrides,
    ) -> Result<EnrichmentPreview, EnrichmentError> {
        if word.trim().is_empty() {
            return Err(EnrichmentError::Validation("word must not be empty".into()));
        }

        let fields = self.generate_fields(word, overrides).await?;
        let audio = self
            .speech
            .synthesize(word)
            .await
            .map_err(stage_err(Stage::AudioWord))?;

        Ok(EnrichmentPreview {
            word: word.to_string(),
            ipa_transcription: fields.ipa_transcription,
            synonyms: fields.relations.synonyms,
            antonyms: fields.relations.antonyms,
            example_sentences_en: fields.example_sentences_en,
            example_sentences_vi: fields.example_sentences_vi,
            meaning_en: fields.meaning_en,
            meaning_vi: fields.meaning_vi,
            word_type: fields.word_type,
            vocab_family: fields.vocab_family,
            audio_base64: BASE64.encode(&audio),
        })
    }

    /// Re-runs the audio step for an existing card, reusing its identity and
    /// therefore the same artifact locations (idempotent overwrite). This is
    /// the recovery path for skeletons left behind by failed pipeline runs.
    pub async fn resume_enrichment(&self, id: &str) -> Result<VocabularyCard, EnrichmentError> {
        let card = cards::find_by_id(&self.db, id)
            .await?
            .ok_or(EnrichmentError::NotFound)?;

        if card.example_sentences_en.len() < EXAMPLE_SENTENCE_COUNT {
            return Err(EnrichmentError::Validation(
                "card has fewer than 2 English example sentences".into(),
            ));
        }

        let refs = self
            .synthesize_all(&card.id, &card.word, &card.example_sentences_en)
            .await?;
        cards::update_artifacts(&self.db, &card.id, &refs).await?;

        cards::find_by_id(&self.db, id)
            .await?
            .ok_or(EnrichmentError::NotFound)
    }

    /// Deletes the record and all three artifacts. The record goes first so a
    /// card never references a deleted artifact. Artifacts are removed even
    /// when the record is already gone, so retrying after a failure between
    /// the two steps still clears whatever is left on disk.
    pub async fn delete_card(&self, id: &str) -> Result<(), EnrichmentError> {
        let record_missing = match cards::delete(&self.db, id).await {
            Ok(()) => false,
            Err(StoreError::NotFound) => true,
            Err(err) => return Err(err.into()),
        };
        self.audio.delete_all(id).await?;

        if record_missing {
            return Err(EnrichmentError::NotFound);
        }
        Ok(())
    }

    async fn generate_fields(
        &self,
        word: &str,
        overrides: &CardOverrides,
    ) -> Result<GeneratedFields, EnrichmentError> {
        let transcription = async {
            match &overrides.ipa_transcription {
                Some(ipa) => Ok(ipa.clone()),
                None => self
                    .transcription
                    .transcribe(word)
                    .await
                    .map_err(stage_err(Stage::Transcription)),
            }
        };

        let relations = async {
            self.lexical
                .synsets(word)
                .await
                .map(|synsets| resolve_relations(&synsets))
                .map_err(stage_err(Stage::LexicalRelations))
        };

        let examples = async {
            let en = match &overrides.example_sentences_en {
                Some(sentences) => sentences.clone(),
                None => self.generate_sentences(word, "English").await?,
            };
            let vi = match &overrides.example_sentences_vi {
                Some(sentences) => sentences.clone(),
                None => self.generate_sentences(word, "Vietnamese").await?,
            };
            if en.len() < EXAMPLE_SENTENCE_COUNT {
                return Err(EnrichmentError::Validation(format!(
                    "at least {EXAMPLE_SENTENCE_COUNT} English example sentences are required"
                )));
            }
            Ok((en, vi))
        };

        let meaning_en = self.text_field(
            &overrides.meaning_en,
            Stage::MeaningEn,
            format!("Define the English word \"{word}\" in one short sentence."),
        );

        let meaning_vi = self.text_field(
            &overrides.meaning_vi,
            Stage::MeaningVi,
            format!(
                "Give the Vietnamese meaning of the English word \"{word}\". \
                 Answer with the Vietnamese translation only."
            ),
        );

        let word_type = self.text_field(
            &overrides.word_type,
            Stage::WordType,
            format!(
                "What part of speech is the word \"{word}\"? \
                 Answer with a single word such as noun, verb or adjective."
            ),
        );

        let vocab_family = async {
            match &overrides.vocab_family {
                Some(family) => Ok(family.clone()),
                None => {
                    let raw = self
                        .generator
                        .generate(
                            SYSTEM_PROMPT,
                            &format!(
                                "List words in the same word family as \"{word}\", \
                                 comma separated, without explanations."
                            ),
                        )
                        .await
                        .map_err(stage_err(Stage::VocabFamily))?;
                    Ok(parse_list(&raw))
                }
            }
        };

        let (ipa_transcription, relations, (en, vi), meaning_en, meaning_vi, word_type, vocab_family) =
            tokio::try_join!(
                transcription,
                relations,
                examples,
                meaning_en,
                meaning_vi,
                word_type,
                vocab_family
            )?;

        Ok(GeneratedFields {
            ipa_transcription,
            relations,
            example_sentences_en: en,
            example_sentences_vi: vi,
            meaning_en,
            meaning_vi,
            word_type,
            vocab_family,
        })
    }

    async fn text_field(
        &self,
        override_value: &Option<String>,
        stage: Stage,
        prompt: String,
    ) -> Result<String, EnrichmentError> {
        match override_value {
            Some(value) => Ok(value.clone()),
            None => self
                .generator
                .generate(SYSTEM_PROMPT, &prompt)
                .await
                .map_err(stage_err(stage)),
        }
    }

    async fn generate_sentences(
        &self,
        word: &str,
        language: &str,
    ) -> Result<Vec<String>, EnrichmentError> {
        let raw = self
            .generator
            .generate(
                SYSTEM_PROMPT,
                &format!(
                    "Write {EXAMPLE_SENTENCE_COUNT} short {language} example sentences \
                     using the word \"{word}\". One sentence per line, no numbering."
                ),
            )
            .await
            .map_err(stage_err(Stage::ExampleSentences))?;

        let sentences = parse_sentences(&raw);
        if sentences.is_empty() {
            return Err(EnrichmentError::ExternalService {
                stage: Stage::ExampleSentences,
                source: ProviderError::Empty,
            });
        }
        Ok(sentences)
    }

    /// Stage 6: three artifacts keyed by the card's identity, synthesized
    /// concurrently. Requires the identity from the skeleton insert and the
    /// example sentences from stage 3.
    async fn synthesize_all(
        &self,
        id: &str,
        word: &str,
        examples_en: &[String],
    ) -> Result<AudioRefs, EnrichmentError> {
        let (word_loc, example1_loc, example2_loc) = tokio::try_join!(
            self.synthesize_one(id, AudioRole::Word, word),
            self.synthesize_one(id, AudioRole::Example1, &examples_en[0]),
            self.synthesize_one(id, AudioRole::Example2, &examples_en[1]),
        )?;

        Ok(AudioRefs {
            word: word_loc,
            example1: example1_loc,
            example2: example2_loc,
        })
    }

    async fn synthesize_one(
        &self,
        id: &str,
        role: AudioRole,
        text: &str,
    ) -> Result<String, EnrichmentError> {
        let bytes = self
            .speech
            .synthesize(text)
            .await
            .map_err(stage_err(audio_stage(role)))?;
        let location = self.audio.write(id, role, &bytes).await?;
        Ok(location)
    }
}

/// One sentence per line; tolerates numbered or bulleted lists and trims to
/// the expected count.
fn parse_sentences(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_list_prefix)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .take(EXAMPLE_SENTENCE_COUNT)
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for piece in raw.split(|c| c == ',' || c == '\n') {
        let item = strip_list_prefix(piece);
        if !item.is_empty() && !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    let trimmed = trimmed
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')', '-', '*'])
        .trim_start();
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_lines() {
        let raw = "The apple is red.\nShe ate an apple.\n";
        assert_eq!(
            parse_sentences(raw),
            vec!["The apple is red.", "She ate an apple."]
        );
    }

    #[test]
    fn strips_numbering_and_bullets() {
        let raw = "1. First sentence.\n- Second sentence.\n3) Third sentence.";
        assert_eq!(
            parse_sentences(raw),
            vec!["First sentence.", "Second sentence."]
        );
    }

    #[test]
    fn parses_comma_separated_family() {
        assert_eq!(
            parse_list("act, action, active,\nactivity"),
            vec!["act", "action", "active", "activity"]
        );
    }

    #[test]
    fn family_list_deduplicates() {
        assert_eq!(parse_list("act, act, action"), vec!["act", "action"]);
    }
}
