use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::progress::{self, UpdateProgressFields};
use crate::response::AppError;
use crate::routes::{authorize, created, require_db, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgressRequest {
    pub card_id: String,
    pub dataset_id: String,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

pub async fn create_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateProgressRequest>,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;
    if req.card_id.trim().is_empty() || req.dataset_id.trim().is_empty() {
        return Err(AppError::validation("cardId and datasetId are required"));
    }

    let db = require_db(&state)?;
    let progress = progress::insert(&db, &claims.sub, &req.card_id, &req.dataset_id).await?;

    Ok(created(progress))
}

pub async fn list_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;

    let db = require_db(&state)?;
    let entries = progress::find_by_user(&db, &claims.sub).await?;

    Ok(success(entries))
}

pub async fn get_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    let entry = progress::find_by_id(&db, &id)
        .await?
        .ok_or_else(|| AppError::not_found("progress record not found"))?;

    Ok(success(entry))
}

pub async fn update_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(changes): Json<UpdateProgressFields>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    progress::update(&db, &id, &changes).await?;

    Ok(success(MessageResponse {
        success: true,
        message: "progress updated",
    }))
}

pub async fn delete_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    progress::delete(&db, &id).await?;

    Ok(success(MessageResponse {
        success: true,
        message: "progress deleted",
    }))
}
