mod auth;
mod cards;
mod datasets;
mod health;
mod progress;
mod settings;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::db::Database;
use crate::response::{json_error, AppError};
use crate::services::enrichment::CardEnricher;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

fn success<T: Serialize>(data: T) -> Response {
    Json(SuccessResponse { success: true, data }).into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(SuccessResponse { success: true, data })).into_response()
}

fn require_db(state: &AppState) -> Result<Arc<Database>, AppError> {
    state
        .db()
        .ok_or_else(|| AppError::service_unavailable("database unavailable"))
}

fn require_enricher(state: &AppState) -> Result<Arc<CardEnricher>, AppError> {
    state
        .enricher()
        .ok_or_else(|| AppError::service_unavailable("enrichment pipeline unavailable"))
}

fn authorize(headers: &axum::http::HeaderMap) -> Result<crate::auth::Claims, AppError> {
    crate::auth::authenticate(headers).map_err(|err| AppError::unauthorized(err.to_string()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/cards", post(cards::create_card))
        .route("/api/cards/generate", post(cards::generate_fields))
        .route(
            "/api/cards/:id",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route("/api/cards/:id/enrich", post(cards::resume_enrichment))
        .route("/api/cards/:id/audio/:role", get(cards::get_audio))
        .route("/api/users/:id/cards", get(cards::list_user_cards))
        .route("/api/datasets/:id/cards", get(cards::list_dataset_cards))
        .route(
            "/api/datasets",
            post(datasets::create_dataset).get(datasets::list_datasets),
        )
        .route(
            "/api/datasets/:id",
            get(datasets::get_dataset)
                .put(datasets::update_dataset)
                .delete(datasets::delete_dataset),
        )
        .route(
            "/api/progress",
            post(progress::create_progress).get(progress::list_progress),
        )
        .route(
            "/api/progress/:id",
            get(progress::get_progress)
                .put(progress::update_progress)
                .delete(progress::delete_progress),
        )
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
