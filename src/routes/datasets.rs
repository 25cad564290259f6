use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::datasets;
use crate::response::AppError;
use crate::routes::{authorize, created, require_db, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDatasetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

pub async fn create_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDatasetRequest>,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;
    if req.name.trim().is_empty() {
        return Err(AppError::validation("dataset name is required"));
    }

    let db = require_db(&state)?;
    let dataset =
        datasets::insert(&db, &claims.sub, req.name.trim(), req.description.as_deref()).await?;

    Ok(created(dataset))
}

pub async fn list_datasets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;

    let db = require_db(&state)?;
    let datasets = datasets::find_by_user(&db, &claims.sub).await?;

    Ok(success(datasets))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    let dataset = datasets::find_by_id(&db, &id)
        .await?
        .ok_or_else(|| AppError::not_found("dataset not found"))?;

    Ok(success(dataset))
}

pub async fn update_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateDatasetRequest>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    datasets::update(&db, &id, req.name.as_deref(), req.description.as_deref()).await?;

    Ok(success(MessageResponse {
        success: true,
        message: "dataset updated",
    }))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    datasets::delete(&db, &id).await?;

    Ok(success(MessageResponse {
        success: true,
        message: "dataset deleted",
    }))
}
