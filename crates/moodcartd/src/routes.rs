//! API routes for moodcartd.
//!
//! The recommend and feedback paths never return errors to the client:
//! the chain and the recorder both degrade internally. Only the stats
//! report, which has no fallback shape, can surface a 500.

use crate::reply;
use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use moodcart_common::{
    AnalyticsReport, FeedbackRequest, FeedbackResponse, HealthResponse, RecommendRequest,
    RecommendResponse,
};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

pub fn api_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/recommend", post(recommend))
        .route("/v1/feedback", post(feedback))
        .route("/v1/stats", get(stats))
        .route("/v1/health", get(health))
}

async fn recommend(
    State(state): State<AppStateArc>,
    Json(request): Json<RecommendRequest>,
) -> Json<RecommendResponse> {
    info!("Recommend request ({} chars)", request.query.len());

    let recommendation = state.engine.recommend(&request.query).await;
    let reading = moodcart_common::EmotionReading {
        emotion: recommendation.emotion,
        confidence: recommendation.confidence,
    };

    let reply = reply::compose(
        state.engine.sources().completion(),
        &request.query,
        reading,
        &recommendation,
        &request.history,
    )
    .await;

    Json(RecommendResponse {
        reply,
        rationale: recommendation.rationale,
        strategy: recommendation.strategy,
        emotion: recommendation.emotion,
        confidence: recommendation.confidence,
        glyph: recommendation.emotion.glyph().to_string(),
        products: recommendation.products,
    })
}

async fn feedback(
    State(state): State<AppStateArc>,
    Json(request): Json<FeedbackRequest>,
) -> Json<FeedbackResponse> {
    info!(
        "Feedback: {} on '{}'",
        request.verdict, request.product_title
    );
    state.recorder.record(request).await;
    Json(FeedbackResponse { recorded: true })
}

async fn stats(
    State(state): State<AppStateArc>,
) -> Result<Json<AnalyticsReport>, (StatusCode, String)> {
    state.db.analytics_report().await.map(Json).map_err(|e| {
        error!("Stats report failed: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "moodcartd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        instance_id: state.instance_id.clone(),
    })
}
