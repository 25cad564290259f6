use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use anki_vocab_backend::config::Config;
use anki_vocab_backend::db::Database;
use anki_vocab_backend::state::AppState;
use anki_vocab_backend::storage::{AudioStore, FsAudioStore};
use anki_vocab_backend::{build_enricher, logging, routes};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    let db = match Database::connect(&config.database_url).await {
        Ok(db) => Some(Arc::new(db)),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized");
            None
        }
    };

    let audio: Option<Arc<dyn AudioStore>> = match FsAudioStore::new(&config.audio_dir) {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            tracing::warn!(error = %err, "audio store not initialized");
            None
        }
    };

    let enricher = match (&db, &audio) {
        (Some(db), Some(audio)) => Some(Arc::new(build_enricher(
            Arc::clone(db),
            Arc::clone(audio),
        ))),
        _ => None,
    };

    let state = AppState::new(db.clone(), enricher, audio);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "vocab backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
