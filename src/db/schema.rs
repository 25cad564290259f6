pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "users" (
    "id" TEXT PRIMARY KEY,
    "username" TEXT NOT NULL UNIQUE,
    "email" TEXT NOT NULL UNIQUE,
    "password_hash" TEXT NOT NULL,
    "created_at" TEXT NOT NULL,
    "last_login" TEXT
);

CREATE TABLE IF NOT EXISTS "datasets" (
    "id" TEXT PRIMARY KEY,
    "user_id" TEXT NOT NULL,
    "name" TEXT NOT NULL,
    "description" TEXT,
    "created_at" TEXT NOT NULL,
    "updated_at" TEXT NOT NULL,
    UNIQUE ("user_id", "name")
);

CREATE TABLE IF NOT EXISTS "vocabulary_cards" (
    "id" TEXT PRIMARY KEY,
    "user_id" TEXT NOT NULL,
    "dataset_id" TEXT NOT NULL,
    "word" TEXT NOT NULL,
    "meaning_en" TEXT,
    "meaning_vi" TEXT,
    "ipa_transcription" TEXT,
    "example_sentences_en" TEXT NOT NULL DEFAULT '[]',
    "example_sentences_vi" TEXT NOT NULL DEFAULT '[]',
    "visual_image_url" TEXT,
    "audio_url_word" TEXT,
    "audio_url_example1" TEXT,
    "audio_url_example2" TEXT,
    "synonyms" TEXT NOT NULL DEFAULT '[]',
    "antonyms" TEXT NOT NULL DEFAULT '[]',
    "word_type" TEXT,
    "vocab_family" TEXT NOT NULL DEFAULT '[]',
    "created_at" TEXT NOT NULL,
    "updated_at" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_cards_user" ON "vocabulary_cards" ("user_id");

CREATE INDEX IF NOT EXISTS "idx_cards_dataset" ON "vocabulary_cards" ("dataset_id");

CREATE TABLE IF NOT EXISTS "user_progress" (
    "id" TEXT PRIMARY KEY,
    "user_id" TEXT NOT NULL,
    "card_id" TEXT NOT NULL,
    "dataset_id" TEXT NOT NULL,
    "status" TEXT NOT NULL DEFAULT 'new',
    "last_reviewed" TEXT,
    "next_review" TEXT,
    "streak" INTEGER NOT NULL DEFAULT 0,
    "ease_factor" REAL NOT NULL DEFAULT 2.5,
    "interval_days" INTEGER NOT NULL DEFAULT 1,
    UNIQUE ("user_id", "card_id")
);

CREATE INDEX IF NOT EXISTS "idx_progress_user" ON "user_progress" ("user_id");

CREATE TABLE IF NOT EXISTS "user_settings" (
    "user_id" TEXT PRIMARY KEY,
    "language_preference" TEXT NOT NULL DEFAULT 'en',
    "daily_goal" INTEGER NOT NULL DEFAULT 20,
    "notification_enabled" INTEGER NOT NULL DEFAULT 1,
    "notification_time" TEXT NOT NULL DEFAULT '09:00',
    "theme" TEXT NOT NULL DEFAULT 'light'
);
"#;

/// Splits the embedded DDL into individual statements (the sqlite driver
/// runs one statement per query).
pub fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_all_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 8);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"users\""));
    }
}
