//! HTTP server for moodcartd.

use crate::feedback::FeedbackRecorder;
use crate::llm::OllamaClient;
use crate::orchestrator::RecommendationEngine;
use crate::routes;
use crate::sources::catalog::{HttpCatalogA, HttpCatalogB};
use crate::sources::web::HttpWebSearch;
use crate::sources::Sources;
use anyhow::Result;
use axum::Router;
use moodcart_common::{MarketConfig, MarketDb};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Application state shared across handlers.
pub struct AppState {
    pub engine: RecommendationEngine,
    pub recorder: FeedbackRecorder,
    pub db: Arc<MarketDb>,
    pub start_time: Instant,
    pub instance_id: String,
}

impl AppState {
    pub fn new(db: Arc<MarketDb>, sources: Sources) -> Self {
        Self {
            engine: RecommendationEngine::new(Arc::clone(&db), sources),
            recorder: FeedbackRecorder::new(Arc::clone(&db)),
            db,
            start_time: Instant::now(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Build production sources from config and run the server.
pub async fn run(config: MarketConfig) -> Result<()> {
    let db = Arc::new(MarketDb::open(config.database.location()).await?);

    let sources = Sources::new(
        Arc::clone(&db),
        Arc::new(OllamaClient::new(&config.llm)),
        Arc::new(HttpCatalogA::new(&config.catalog_a)),
        Arc::new(HttpCatalogB::new(&config.catalog_b)),
        Arc::new(HttpWebSearch::new(&config.search)),
        config.currency.clone(),
    );

    if !config.search.is_configured() {
        info!("Web search credentials absent; the web step will yield no results");
    }

    let state = Arc::new(AppState::new(db, sources));

    let app = Router::new()
        .merge(routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Localhost only; the CLI is the only intended client
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
