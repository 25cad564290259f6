use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::{is_unique_violation, Database, StoreError};

/// Per (user, card, dataset) review state. The spaced-repetition fields
/// (ease factor, interval, streak) are a storage contract only; no scheduler
/// consumes them here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: String,
    pub user_id: String,
    pub card_id: String,
    pub dataset_id: String,
    pub status: String,
    pub last_reviewed: Option<String>,
    pub next_review: Option<String>,
    pub streak: i64,
    pub ease_factor: f64,
    pub interval_days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressFields {
    pub status: Option<String>,
    pub last_reviewed: Option<String>,
    pub next_review: Option<String>,
    pub streak: Option<i64>,
    pub ease_factor: Option<f64>,
    pub interval_days: Option<i64>,
}

pub async fn insert(
    db: &Database,
    user_id: &str,
    card_id: &str,
    dataset_id: &str,
) -> Result<UserProgress, StoreError> {
    let progress = UserProgress {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        card_id: card_id.to_string(),
        dataset_id: dataset_id.to_string(),
        status: "new".to_string(),
        last_reviewed: None,
        next_review: None,
        streak: 0,
        ease_factor: 2.5,
        interval_days: 1,
    };

    sqlx::query(
        r#"
        INSERT INTO "user_progress" (
            "id", "user_id", "card_id", "dataset_id", "status",
            "streak", "ease_factor", "interval_days"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&progress.id)
    .bind(&progress.user_id)
    .bind(&progress.card_id)
    .bind(&progress.dataset_id)
    .bind(&progress.status)
    .bind(progress.streak)
    .bind(progress.ease_factor)
    .bind(progress.interval_days)
    .execute(db.pool())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::Conflict("progress already tracked for this card".to_string())
        } else {
            StoreError::Sqlx(err)
        }
    })?;

    Ok(progress)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<UserProgress>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "user_progress" WHERE "id" = ?"#)
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row.map(|r| progress_from_row(&r)))
}

pub async fn find_by_user(db: &Database, user_id: &str) -> Result<Vec<UserProgress>, StoreError> {
    let rows = sqlx::query(r#"SELECT * FROM "user_progress" WHERE "user_id" = ? ORDER BY "rowid""#)
        .bind(user_id)
        .fetch_all(db.pool())
        .await?;
    Ok(rows.iter().map(progress_from_row).collect())
}

pub async fn update(
    db: &Database,
    id: &str,
    changes: &UpdateProgressFields,
) -> Result<(), StoreError> {
    let existing = find_by_id(db, id).await?.ok_or(StoreError::NotFound)?;

    sqlx::query(
        r#"
        UPDATE "user_progress"
        SET "status" = ?, "last_reviewed" = ?, "next_review" = ?,
            "streak" = ?, "ease_factor" = ?, "interval_days" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(changes.status.as_deref().unwrap_or(&existing.status))
    .bind(changes.last_reviewed.as_deref().or(existing.last_reviewed.as_deref()))
    .bind(changes.next_review.as_deref().or(existing.next_review.as_deref()))
    .bind(changes.streak.unwrap_or(existing.streak))
    .bind(changes.ease_factor.unwrap_or(existing.ease_factor))
    .bind(changes.interval_days.unwrap_or(existing.interval_days))
    .bind(id)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn delete(db: &Database, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"DELETE FROM "user_progress" WHERE "id" = ?"#)
        .bind(id)
        .execute(db.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

fn progress_from_row(row: &SqliteRow) -> UserProgress {
    UserProgress {
        id: row.get("id"),
        user_id: row.get("user_id"),
        card_id: row.get("card_id"),
        dataset_id: row.get("dataset_id"),
        status: row.get("status"),
        last_reviewed: row.get("last_reviewed"),
        next_review: row.get("next_review"),
        streak: row.get("streak"),
        ease_factor: row.get("ease_factor"),
        interval_days: row.get("interval_days"),
    }
}
