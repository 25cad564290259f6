use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::db::settings::{self, UserSettings};
use crate::response::AppError;
use crate::routes::{authorize, require_db, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub language_preference: Option<String>,
    pub daily_goal: Option<i64>,
    pub notification_enabled: Option<bool>,
    pub notification_time: Option<String>,
    pub theme: Option<String>,
}

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;

    let db = require_db(&state)?;
    let settings = settings::get_or_default(&db, &claims.sub).await?;

    Ok(success(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;

    let db = require_db(&state)?;
    let current = settings::get_or_default(&db, &claims.sub).await?;

    let updated = UserSettings {
        user_id: claims.sub.clone(),
        language_preference: req.language_preference.unwrap_or(current.language_preference),
        daily_goal: req.daily_goal.unwrap_or(current.daily_goal),
        notification_enabled: req.notification_enabled.unwrap_or(current.notification_enabled),
        notification_time: req.notification_time.unwrap_or(current.notification_time),
        theme: req.theme.unwrap_or(current.theme),
    };
    settings::upsert(&db, &updated).await?;

    Ok(success(updated))
}
