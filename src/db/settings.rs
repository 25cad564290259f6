use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{Database, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub language_preference: String,
    pub daily_goal: i64,
    pub notification_enabled: bool,
    pub notification_time: String,
    pub theme: String,
}

impl UserSettings {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            language_preference: "en".to_string(),
            daily_goal: 20,
            notification_enabled: true,
            notification_time: "09:00".to_string(),
            theme: "light".to_string(),
        }
    }
}

/// Returns the stored settings, or the defaults when the user has never
/// saved any.
pub async fn get_or_default(db: &Database, user_id: &str) -> Result<UserSettings, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "user_settings" WHERE "user_id" = ?"#)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row
        .map(|r| settings_from_row(&r))
        .unwrap_or_else(|| UserSettings::defaults_for(user_id)))
}

pub async fn upsert(db: &Database, settings: &UserSettings) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO "user_settings" (
            "user_id", "language_preference", "daily_goal",
            "notification_enabled", "notification_time", "theme"
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT ("user_id") DO UPDATE SET
            "language_preference" = excluded."language_preference",
            "daily_goal" = excluded."daily_goal",
            "notification_enabled" = excluded."notification_enabled",
            "notification_time" = excluded."notification_time",
            "theme" = excluded."theme"
        "#,
    )
    .bind(&settings.user_id)
    .bind(&settings.language_preference)
    .bind(settings.daily_goal)
    .bind(settings.notification_enabled)
    .bind(&settings.notification_time)
    .bind(&settings.theme)
    .execute(db.pool())
    .await?;
    Ok(())
}

fn settings_from_row(row: &SqliteRow) -> UserSettings {
    UserSettings {
        user_id: row.get("user_id"),
        language_preference: row.get("language_preference"),
        daily_goal: row.get("daily_goal"),
        notification_enabled: row.get("notification_enabled"),
        notification_time: row.get("notification_time"),
        theme: row.get("theme"),
    }
}
