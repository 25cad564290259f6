use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_iso, Database, StoreError};

/// The central entity. Audio references are either all absent (skeleton
/// state, pending pipeline completion) or all present and resolvable in the
/// artifact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyCard {
    pub id: String,
    pub user_id: String,
    pub dataset_id: String,
    pub word: String,
    pub meaning_en: Option<String>,
    pub meaning_vi: Option<String>,
    pub ipa_transcription: Option<String>,
    pub example_sentences_en: Vec<String>,
    pub example_sentences_vi: Vec<String>,
    pub visual_image_url: Option<String>,
    pub audio_url_word: Option<String>,
    pub audio_url_example1: Option<String>,
    pub audio_url_example2: Option<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub word_type: Option<String>,
    pub vocab_family: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl VocabularyCard {
    pub fn is_skeleton(&self) -> bool {
        self.audio_url_word.is_none()
            && self.audio_url_example1.is_none()
            && self.audio_url_example2.is_none()
    }
}

/// Text fields of a card before the store has assigned it an identity.
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub user_id: String,
    pub dataset_id: String,
    pub word: String,
    pub meaning_en: Option<String>,
    pub meaning_vi: Option<String>,
    pub ipa_transcription: Option<String>,
    pub example_sentences_en: Vec<String>,
    pub example_sentences_vi: Vec<String>,
    pub visual_image_url: Option<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub word_type: Option<String>,
    pub vocab_family: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRefs {
    pub word: String,
    pub example1: String,
    pub example2: String,
}

/// Partial update for direct field edits. `user_id` is deliberately not
/// updatable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardFields {
    pub word: Option<String>,
    pub meaning_en: Option<String>,
    pub meaning_vi: Option<String>,
    pub ipa_transcription: Option<String>,
    pub example_sentences_en: Option<Vec<String>>,
    pub example_sentences_vi: Option<Vec<String>>,
    pub visual_image_url: Option<String>,
    pub word_type: Option<String>,
    pub vocab_family: Option<Vec<String>>,
}

impl UpdateCardFields {
    pub fn is_empty(&self) -> bool {
        self.word.is_none()
            && self.meaning_en.is_none()
            && self.meaning_vi.is_none()
            && self.ipa_transcription.is_none()
            && self.example_sentences_en.is_none()
            && self.example_sentences_vi.is_none()
            && self.visual_image_url.is_none()
            && self.word_type.is_none()
            && self.vocab_family.is_none()
    }
}

/// Assigns a fresh identity, stores the draft with null audio fields and
/// returns the identity. A single-row insert, so the skeleton is visible
/// atomically or not at all.
pub async fn insert_skeleton(db: &Database, draft: &CardDraft) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();
    let now = now_iso();

    sqlx::query(
        r#"
        INSERT INTO "vocabulary_cards" (
            "id", "user_id", "dataset_id", "word", "meaning_en", "meaning_vi",
            "ipa_transcription", "example_sentences_en", "example_sentences_vi",
            "visual_image_url", "synonyms", "antonyms", "word_type",
            "vocab_family", "created_at", "updated_at"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&draft.user_id)
    .bind(&draft.dataset_id)
    .bind(&draft.word)
    .bind(&draft.meaning_en)
    .bind(&draft.meaning_vi)
    .bind(&draft.ipa_transcription)
    .bind(to_json(&draft.example_sentences_en))
    .bind(to_json(&draft.example_sentences_vi))
    .bind(&draft.visual_image_url)
    .bind(to_json(&draft.synonyms))
    .bind(to_json(&draft.antonyms))
    .bind(&draft.word_type)
    .bind(to_json(&draft.vocab_family))
    .bind(&now)
    .bind(&now)
    .execute(db.pool())
    .await?;

    Ok(id)
}

/// Sets the three audio fields in one statement and refreshes `updated_at`.
pub async fn update_artifacts(
    db: &Database,
    id: &str,
    refs: &AudioRefs,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE "vocabulary_cards"
        SET "audio_url_word" = ?, "audio_url_example1" = ?,
            "audio_url_example2" = ?, "updated_at" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&refs.word)
    .bind(&refs.example1)
    .bind(&refs.example2)
    .bind(now_iso())
    .bind(id)
    .execute(db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub async fn update_fields(
    db: &Database,
    id: &str,
    changes: &UpdateCardFields,
) -> Result<(), StoreError> {
    if changes.is_empty() {
        // Still bump updated_at so the caller observes the mutation attempt.
        return touch(db, id).await;
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE \"vocabulary_cards\" SET ");
    let mut fields = builder.separated(", ");

    if let Some(word) = &changes.word {
        fields.push("\"word\" = ").push_bind_unseparated(word.clone());
    }
    if let Some(meaning_en) = &changes.meaning_en {
        fields.push("\"meaning_en\" = ").push_bind_unseparated(meaning_en.clone());
    }
    if let Some(meaning_vi) = &changes.meaning_vi {
        fields.push("\"meaning_vi\" = ").push_bind_unseparated(meaning_vi.clone());
    }
    if let Some(ipa) = &changes.ipa_transcription {
        fields.push("\"ipa_transcription\" = ").push_bind_unseparated(ipa.clone());
    }
    if let Some(examples_en) = &changes.example_sentences_en {
        fields
            .push("\"example_sentences_en\" = ")
            .push_bind_unseparated(to_json(examples_en));
    }
    if let Some(examples_vi) = &changes.example_sentences_vi {
        fields
            .push("\"example_sentences_vi\" = ")
            .push_bind_unseparated(to_json(examples_vi));
    }
    if let Some(image) = &changes.visual_image_url {
        fields.push("\"visual_image_url\" = ").push_bind_unseparated(image.clone());
    }
    if let Some(word_type) = &changes.word_type {
        fields.push("\"word_type\" = ").push_bind_unseparated(word_type.clone());
    }
    if let Some(family) = &changes.vocab_family {
        fields.push("\"vocab_family\" = ").push_bind_unseparated(to_json(family));
    }
    fields.push("\"updated_at\" = ").push_bind_unseparated(now_iso());

    builder.push(" WHERE \"id\" = ").push_bind(id.to_string());

    let result = builder.build().execute(db.pool()).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<VocabularyCard>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "vocabulary_cards" WHERE "id" = ?"#)
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    row.map(|r| card_from_row(&r)).transpose()
}

pub async fn find_by_user(db: &Database, user_id: &str) -> Result<Vec<VocabularyCard>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT * FROM "vocabulary_cards" WHERE "user_id" = ? ORDER BY "rowid""#,
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;
    rows.iter().map(card_from_row).collect()
}

pub async fn find_by_dataset(
    db: &Database,
    dataset_id: &str,
) -> Result<Vec<VocabularyCard>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT * FROM "vocabulary_cards" WHERE "dataset_id" = ? ORDER BY "rowid""#,
    )
    .bind(dataset_id)
    .fetch_all(db.pool())
    .await?;
    rows.iter().map(card_from_row).collect()
}

pub async fn delete(db: &Database, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"DELETE FROM "vocabulary_cards" WHERE "id" = ?"#)
        .bind(id)
        .execute(db.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// All-null-audio cards whose last update is older than the cutoff. These
/// are orphaned skeletons from failed pipeline runs, eligible for
/// re-enrichment by identity.
pub async fn find_stale_skeletons(
    db: &Database,
    updated_before: &str,
) -> Result<Vec<VocabularyCard>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "vocabulary_cards"
        WHERE "audio_url_word" IS NULL
          AND "audio_url_example1" IS NULL
          AND "audio_url_example2" IS NULL
          AND "updated_at" < ?
        ORDER BY "updated_at"
        "#,
    )
    .bind(updated_before)
    .fetch_all(db.pool())
    .await?;
    rows.iter().map(card_from_row).collect()
}

async fn touch(db: &Database, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"UPDATE "vocabulary_cards" SET "updated_at" = ? WHERE "id" = ?"#)
        .bind(now_iso())
        .bind(id)
        .execute(db.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

fn card_from_row(row: &SqliteRow) -> Result<VocabularyCard, StoreError> {
    Ok(VocabularyCard {
        id: row.get("id"),
        user_id: row.get("user_id"),
        dataset_id: row.get("dataset_id"),
        word: row.get("word"),
        meaning_en: row.get("meaning_en"),
        meaning_vi: row.get("meaning_vi"),
        ipa_transcription: row.get("ipa_transcription"),
        example_sentences_en: from_json(row.get("example_sentences_en")),
        example_sentences_vi: from_json(row.get("example_sentences_vi")),
        visual_image_url: row.get("visual_image_url"),
        audio_url_word: row.get("audio_url_word"),
        audio_url_example1: row.get("audio_url_example1"),
        audio_url_example2: row.get("audio_url_example2"),
        synonyms: from_json(row.get("synonyms")),
        antonyms: from_json(row.get("antonyms")),
        word_type: row.get("word_type"),
        vocab_family: from_json(row.get("vocab_family")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn from_json(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_default()
}
