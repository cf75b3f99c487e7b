//! The recommendation chain.
//!
//! Seven strategies tried in fixed priority order; the chain halts at the
//! first one whose termination condition is met. Cheap high-confidence
//! sources win outright on any hit, generative and web sources must
//! deliver a minimum batch before they are trusted. Exactly one analytics
//! row is written per call, and no error ever crosses this boundary: the
//! caller always gets a product list and a rationale.

use crate::emotion;
use crate::sources::Sources;
use moodcart_common::{Emotion, MarketDb, Product, Recommendation, SearchAttempt, Strategy};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A learned pattern must have succeeded strictly more often than this
/// before the chain trusts it over the generative sources.
const PATTERN_MIN_SUCCESSES: i64 = 2;

/// Minimum batch size for the semantic and web steps to short-circuit.
const GENERATIVE_MIN_RESULTS: usize = 3;

/// Queries this short (after trimming) skip semantic generation.
const SEMANTIC_MIN_QUERY_LEN: usize = 3;

/// Rationale returned when every source came up empty.
pub const STILL_LEARNING: &str =
    "I'm still learning! Try describing what you need differently.";

pub struct RecommendationEngine {
    db: Arc<MarketDb>,
    sources: Sources,
}

impl RecommendationEngine {
    pub fn new(db: Arc<MarketDb>, sources: Sources) -> Self {
        Self { db, sources }
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Run the chain for one utterance.
    pub async fn recommend(&self, query: &str) -> Recommendation {
        let started = Instant::now();
        let reading = emotion::classify(query);
        info!(
            "Recommendation chain start: emotion={} confidence={:.2}",
            reading.emotion, reading.confidence
        );

        let (strategy, products, rationale) = self.run_chain(query, reading.emotion).await;

        let attempt = SearchAttempt {
            query: query.to_string(),
            emotion: reading.emotion,
            strategy,
            products_found: products.len(),
            latency_ms: started.elapsed().as_millis() as i64,
        };
        if let Err(e) = self.db.record_attempt(&attempt).await {
            warn!("Failed to record attempt: {:#}", e);
        }

        info!(
            "Recommendation chain done: strategy={} products={} latency={}ms",
            strategy, attempt.products_found, attempt.latency_ms
        );

        Recommendation {
            products,
            rationale,
            strategy,
            emotion: reading.emotion,
            confidence: reading.confidence,
        }
    }

    async fn run_chain(&self, query: &str, emotion: Emotion) -> (Strategy, Vec<Product>, String) {
        let trimmed = query.trim();

        // 1. Local inventory always wins, a single product is enough.
        let local = self.sources.local_business(query, emotion).await;
        if !local.is_empty() {
            let rationale = format!("Found {} products from local partner businesses", local.len());
            return (Strategy::LocalBusiness, local, rationale);
        }

        // 2. A sufficiently proven pattern replays its categories.
        if let Some(pattern) = self.lookup_pattern(query, emotion).await {
            if pattern.success_count > PATTERN_MIN_SUCCESSES {
                let products = self.sources.pattern_fanout(&pattern.categories).await;
                if !products.is_empty() {
                    let rationale = format!(
                        "Using a pattern that worked {} times before",
                        pattern.success_count
                    );
                    return (Strategy::HistoricalPattern, products, rationale);
                }
            }
        }

        // 3. Semantic generation, only for queries with some substance.
        if trimmed.chars().count() > SEMANTIC_MIN_QUERY_LEN {
            let products = self.sources.semantic(query).await;
            if products.len() >= GENERATIVE_MIN_RESULTS {
                return (
                    Strategy::SemanticAi,
                    products,
                    "AI generated matches for your request".to_string(),
                );
            }
        }

        // 4. Web search, same minimum batch.
        if !trimmed.is_empty() {
            let products = self.sources.web_search(query).await;
            if products.len() >= GENERATIVE_MIN_RESULTS {
                return (
                    Strategy::WebSearch,
                    products,
                    "Found real products from across the web".to_string(),
                );
            }
        }

        // 5. Context-aware category pick, any hit terminates.
        let (products, categories) = self.sources.context_aware(query, emotion).await;
        if !products.is_empty() {
            let rationale = format!("Context-aware pick: {}", categories.join(", "));
            return (Strategy::ContextAi, products, rationale);
        }

        // 6. One AI-chosen category across both catalogs.
        let (products, category) = self.sources.ai_fallback(query, emotion).await;
        if !products.is_empty() {
            let category = category.unwrap_or_else(|| "general".to_string());
            let rationale = format!("AI chose {} products for your {} mood", category, emotion);
            return (Strategy::AiFallback, products, rationale);
        }

        // 7. Generic top listings, then the defined empty terminal.
        let products = self.sources.safety().await;
        if !products.is_empty() {
            return (
                Strategy::SafetyFallback,
                products,
                "Some popular products while I learn your preferences".to_string(),
            );
        }

        (Strategy::NoResults, Vec::new(), STILL_LEARNING.to_string())
    }

    async fn lookup_pattern(
        &self,
        query: &str,
        emotion: Emotion,
    ) -> Option<moodcart_common::SuccessPattern> {
        match self.db.find_pattern(query, emotion).await {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Pattern lookup failed: {:#}", e);
                None
            }
        }
    }
}
