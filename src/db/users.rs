use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::{is_unique_violation, now_iso, Database, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

pub async fn insert(
    db: &Database,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, StoreError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        created_at: now_iso(),
        last_login: None,
    };

    sqlx::query(
        r#"
        INSERT INTO "users" ("id", "username", "email", "password_hash", "created_at")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.created_at)
    .execute(db.pool())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::Conflict("username or email already registered".to_string())
        } else {
            StoreError::Sqlx(err)
        }
    })?;

    Ok(user)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<User>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "id" = ?"#)
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row.map(|r| user_from_row(&r)))
}

pub async fn find_by_username(db: &Database, username: &str) -> Result<Option<User>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "username" = ?"#)
        .bind(username)
        .fetch_optional(db.pool())
        .await?;
    Ok(row.map(|r| user_from_row(&r)))
}

pub async fn set_last_login(db: &Database, id: &str) -> Result<(), StoreError> {
    sqlx::query(r#"UPDATE "users" SET "last_login" = ? WHERE "id" = ?"#)
        .bind(now_iso())
        .bind(id)
        .execute(db.pool())
        .await?;
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        last_login: row.get("last_login"),
    }
}
