use std::sync::Arc;
use std::time::Instant;

use crate::db::Database;
use crate::services::enrichment::CardEnricher;
use crate::storage::AudioStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    db: Option<Arc<Database>>,
    enricher: Option<Arc<CardEnricher>>,
    audio: Option<Arc<dyn AudioStore>>,
}

impl AppState {
    pub fn new(
        db: Option<Arc<Database>>,
        enricher: Option<Arc<CardEnricher>>,
        audio: Option<Arc<dyn AudioStore>>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            db,
            enricher,
            audio,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn db(&self) -> Option<Arc<Database>> {
        self.db.clone()
    }

    pub fn enricher(&self) -> Option<Arc<CardEnricher>> {
        self.enricher.clone()
    }

    pub fn audio(&self) -> Option<Arc<dyn AudioStore>> {
        self.audio.clone()
    }
}
