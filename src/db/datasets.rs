use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::{is_unique_violation, now_iso, Database, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn insert(
    db: &Database,
    user_id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Dataset, StoreError> {
    let now = now_iso();
    let dataset = Dataset {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: description.map(|d| d.to_string()),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "datasets" ("id", "user_id", "name", "description", "created_at", "updated_at")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&dataset.id)
    .bind(&dataset.user_id)
    .bind(&dataset.name)
    .bind(&dataset.description)
    .bind(&dataset.created_at)
    .bind(&dataset.updated_at)
    .execute(db.pool())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::Conflict(format!("dataset '{name}' already exists for this user"))
        } else {
            StoreError::Sqlx(err)
        }
    })?;

    Ok(dataset)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Dataset>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "datasets" WHERE "id" = ?"#)
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row.map(|r| dataset_from_row(&r)))
}

pub async fn find_by_user(db: &Database, user_id: &str) -> Result<Vec<Dataset>, StoreError> {
    let rows = sqlx::query(r#"SELECT * FROM "datasets" WHERE "user_id" = ? ORDER BY "rowid""#)
        .bind(user_id)
        .fetch_all(db.pool())
        .await?;
    Ok(rows.iter().map(dataset_from_row).collect())
}

pub async fn update(
    db: &Database,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<(), StoreError> {
    let existing = find_by_id(db, id).await?.ok_or(StoreError::NotFound)?;

    sqlx::query(
        r#"UPDATE "datasets" SET "name" = ?, "description" = ?, "updated_at" = ? WHERE "id" = ?"#,
    )
    .bind(name.unwrap_or(&existing.name))
    .bind(description.or(existing.description.as_deref()))
    .bind(now_iso())
    .bind(id)
    .execute(db.pool())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::Conflict("dataset name already taken for this user".to_string())
        } else {
            StoreError::Sqlx(err)
        }
    })?;

    Ok(())
}

pub async fn delete(db: &Database, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"DELETE FROM "datasets" WHERE "id" = ?"#)
        .bind(id)
        .execute(db.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

fn dataset_from_row(row: &SqliteRow) -> Dataset {
    Dataset {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
