use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::routes::success;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    database: bool,
    enrichment: bool,
}

pub async fn health(State(state): State<AppState>) -> Response {
    success(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        database: state.db().is_some(),
        enrichment: state.enricher().is_some(),
    })
}
