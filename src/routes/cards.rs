use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::cards::{self, UpdateCardFields};
use crate::response::AppError;
use crate::routes::{authorize, created, require_db, require_enricher, success};
use crate::services::enrichment::CardOverrides;
use crate::state::AppState;
use crate::storage::AudioRole;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub dataset_id: String,
    pub word: String,
    #[serde(flatten)]
    pub overrides: CardOverrides,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFieldsRequest {
    pub word: String,
    #[serde(flatten)]
    pub overrides: CardOverrides,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

pub async fn create_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCardRequest>,
) -> Result<Response, AppError> {
    let claims = authorize(&headers)?;
    if req.dataset_id.trim().is_empty() {
        return Err(AppError::validation("datasetId is required"));
    }

    let enricher = require_enricher(&state)?;
    let card = enricher
        .create_card(&claims.sub, &req.dataset_id, &req.word, &req.overrides)
        .await?;

    Ok(created(card))
}

pub async fn generate_fields(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateFieldsRequest>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let enricher = require_enricher(&state)?;
    let preview = enricher.generate_preview(&req.word, &req.overrides).await?;

    Ok(success(preview))
}

pub async fn get_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    let card = cards::find_by_id(&db, &id)
        .await?
        .ok_or_else(|| AppError::not_found("card not found"))?;

    Ok(success(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(changes): Json<UpdateCardFields>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    cards::update_fields(&db, &id, &changes).await?;

    Ok(success(MessageResponse {
        success: true,
        message: "card updated",
    }))
}

pub async fn delete_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let enricher = require_enricher(&state)?;
    enricher.delete_card(&id).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            success: true,
            message: "card deleted",
        }),
    )
        .into_response())
}

pub async fn resume_enrichment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let enricher = require_enricher(&state)?;
    let card = enricher.resume_enrichment(&id).await?;

    Ok(success(card))
}

pub async fn get_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, role)): Path<(String, String)>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let role = AudioRole::from_str(&role)
        .ok_or_else(|| AppError::validation("role must be one of word, example1, example2"))?;

    let audio = state
        .audio()
        .ok_or_else(|| AppError::service_unavailable("audio store unavailable"))?;
    let bytes = audio.read(&id, role).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        bytes,
    )
        .into_response())
}

pub async fn list_user_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    let cards = cards::find_by_user(&db, &user_id).await?;

    Ok(success(cards))
}

pub async fn list_dataset_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(dataset_id): Path<String>,
) -> Result<Response, AppError> {
    authorize(&headers)?;

    let db = require_db(&state)?;
    let cards = cards::find_by_dataset(&db, &dataset_id).await?;

    Ok(success(cards))
}
