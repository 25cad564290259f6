pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::Database;
use crate::services::enrichment::CardEnricher;
use crate::services::lexical::HttpLexicalClient;
use crate::services::speech::HttpSpeechClient;
use crate::services::text_generation::LlmTextGenerator;
use crate::services::transcription::HttpTranscriptionClient;
use crate::state::AppState;
use crate::storage::{AudioStore, FsAudioStore};

/// Builds the router against whatever the environment provides. Used by the
/// integration tests; `main` does the same wiring with explicit logging.
pub async fn create_app() -> axum::Router {
    let config = Config::from_env();

    let db = match Database::connect(&config.database_url).await {
        Ok(db) => Some(Arc::new(db)),
        Err(_) => None,
    };

    let audio: Option<Arc<dyn AudioStore>> = FsAudioStore::new(&config.audio_dir)
        .ok()
        .map(|store| Arc::new(store) as Arc<dyn AudioStore>);

    let enricher = match (&db, &audio) {
        (Some(db), Some(audio)) => Some(Arc::new(build_enricher(
            Arc::clone(db),
            Arc::clone(audio),
        ))),
        _ => None,
    };

    let state = AppState::new(db, enricher, audio);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Wires the orchestrator to the production HTTP clients.
pub fn build_enricher(db: Arc<Database>, audio: Arc<dyn AudioStore>) -> CardEnricher {
    CardEnricher::new(
        db,
        audio,
        Arc::new(HttpTranscriptionClient::from_env()),
        Arc::new(HttpLexicalClient::from_env()),
        Arc::new(LlmTextGenerator::from_env()),
        Arc::new(HttpSpeechClient::from_env()),
    )
}
