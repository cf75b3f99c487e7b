//! Feedback recorder.
//!
//! Every verdict is appended to the feedback log. Accepts additionally
//! reinforce the pattern store with the accepted product's own category,
//! so the next similar query in the same mood can short-circuit to it.
//! Persistence errors are logged and swallowed; this path never fails the
//! caller.

use crate::emotion;
use moodcart_common::{FeedbackEvent, FeedbackRequest, FeedbackVerdict, MarketDb};
use std::sync::Arc;
use tracing::{info, warn};

/// Category credited when the accepted product carried none.
const FALLBACK_CATEGORY: &str = "general";

pub struct FeedbackRecorder {
    db: Arc<MarketDb>,
}

impl FeedbackRecorder {
    pub fn new(db: Arc<MarketDb>) -> Self {
        Self { db }
    }

    /// Record one verdict. Infallible by design.
    pub async fn record(&self, request: FeedbackRequest) {
        let event = FeedbackEvent {
            product_title: request.product_title.clone(),
            query: request.query.clone(),
            verdict: request.verdict,
            source: request.source,
        };
        if let Err(e) = self.db.record_feedback(&event).await {
            warn!("Failed to record feedback event: {:#}", e);
        }

        if request.verdict != FeedbackVerdict::Accept {
            return;
        }

        let reading = emotion::classify(&request.query);
        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(FALLBACK_CATEGORY)
            .to_lowercase();

        if let Err(e) = self
            .db
            .record_success(&request.query, reading.emotion, &[category.clone()])
            .await
        {
            warn!("Failed to reinforce pattern: {:#}", e);
            return;
        }

        info!(
            "Accepted '{}' reinforced category '{}' for emotion {}",
            request.product_title, category, reading.emotion
        );
    }
}
