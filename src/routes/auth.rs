use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::users;
use crate::response::AppError;
use crate::routes::{created, require_db, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    user_id: String,
    username: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::validation("username, email and password are required"));
    }

    let db = require_db(&state)?;
    let password_hash = auth::hash_password(&req.password)
        .map_err(|err| AppError::internal(err.to_string()))?;
    let user = users::insert(&db, req.username.trim(), req.email.trim(), &password_hash).await?;

    let token = auth::issue_token(&user.id, &user.username)
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok(created(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let db = require_db(&state)?;

    let user = users::find_by_username(&db, &req.username)
        .await?
        .filter(|user| auth::verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| AppError::unauthorized("invalid username or password"))?;

    users::set_last_login(&db, &user.id).await?;

    let token = auth::issue_token(&user.id, &user.username)
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok(success(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}
