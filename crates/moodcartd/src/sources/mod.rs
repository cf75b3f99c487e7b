//! Product source adapters.
//!
//! [`Sources`] bundles every product source behind methods that return
//! plain `Vec<Product>`: transport, parse and upstream errors are logged
//! and swallowed at this boundary, so the orchestrator never fails because
//! one source is down. Each method caps its results and tags them with the
//! strategy that requested them.

pub mod catalog;
pub mod context;
pub mod semantic;
pub mod web;

use crate::llm::CompletionClient;
use catalog::{to_products, CatalogClient};
use context::LocalContext;
use moodcart_common::{CurrencyPolicy, Emotion, MarketDb, Product, Strategy};
use std::sync::Arc;
use tracing::debug;
use web::{PriceExtractor, WebSearchClient};

/// Cap on products any single source hands to the orchestrator.
pub const SOURCE_LIMIT: usize = 6;

/// Per-category limit for the historical-pattern fan-out.
const PATTERN_PER_CATEGORY: usize = 3;

/// How many learned categories the pattern fan-out uses.
const PATTERN_TOP_CATEGORIES: usize = 2;

/// Every product source the orchestrator can draw from.
pub struct Sources {
    db: Arc<MarketDb>,
    llm: Arc<dyn CompletionClient>,
    catalog_a: Arc<dyn CatalogClient>,
    catalog_b: Arc<dyn CatalogClient>,
    web: Arc<dyn WebSearchClient>,
    currency: CurrencyPolicy,
    prices: PriceExtractor,
}

impl Sources {
    pub fn new(
        db: Arc<MarketDb>,
        llm: Arc<dyn CompletionClient>,
        catalog_a: Arc<dyn CatalogClient>,
        catalog_b: Arc<dyn CatalogClient>,
        web: Arc<dyn WebSearchClient>,
        currency: CurrencyPolicy,
    ) -> Self {
        let prices = PriceExtractor::new(&currency);
        Self {
            db,
            llm,
            catalog_a,
            catalog_b,
            web,
            currency,
            prices,
        }
    }

    pub fn completion(&self) -> &dyn CompletionClient {
        self.llm.as_ref()
    }

    /// Active local inventory matching the query or emotion, newest first.
    pub async fn local_business(&self, query: &str, emotion: Emotion) -> Vec<Product> {
        match self.db.local_products(query, emotion, &self.currency).await {
            Ok(products) => products,
            Err(e) => {
                debug!("Local catalog unavailable: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Catalog A over the top learned categories, for the pattern step.
    pub async fn pattern_fanout(&self, categories: &[String]) -> Vec<Product> {
        let mut merged = Vec::new();
        for category in categories.iter().take(PATTERN_TOP_CATEGORIES) {
            match self.catalog_a.by_category(category, PATTERN_PER_CATEGORY).await {
                Ok(items) => {
                    merged.extend(to_products(items, Strategy::HistoricalPattern, &self.currency))
                }
                Err(e) => debug!("Pattern fan-out failed for {}: {:#}", category, e),
            }
        }
        merged.truncate(SOURCE_LIMIT);
        merged
    }

    /// AI-generated products for the query.
    pub async fn semantic(&self, query: &str) -> Vec<Product> {
        semantic::generate(self.llm.as_ref(), query, SOURCE_LIMIT, &self.currency).await
    }

    /// Real products scraped from web search results.
    pub async fn web_search(&self, query: &str) -> Vec<Product> {
        match self.web.search(query, SOURCE_LIMIT).await {
            Ok(hits) => web::to_products(hits, &self.prices, SOURCE_LIMIT),
            Err(e) => {
                debug!("Web search unavailable: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Category fan-out driven by emotion and local time.
    pub async fn context_aware(&self, query: &str, emotion: Emotion) -> (Vec<Product>, Vec<String>) {
        let ctx = LocalContext::now();
        context::recommend(
            self.llm.as_ref(),
            self.catalog_a.as_ref(),
            self.catalog_b.as_ref(),
            query,
            emotion,
            &ctx,
            &self.currency,
        )
        .await
    }

    /// One AI-chosen category, catalog A first, catalog B when A is empty.
    pub async fn ai_fallback(&self, query: &str, emotion: Emotion) -> (Vec<Product>, Option<String>) {
        let Some(category) = context::pick_fallback_category(self.llm.as_ref(), query, emotion).await
        else {
            return (Vec::new(), None);
        };

        let from_a = match self.catalog_a.by_category(&category, SOURCE_LIMIT).await {
            Ok(items) => to_products(items, Strategy::AiFallback, &self.currency),
            Err(e) => {
                debug!("Catalog A fallback failed for {}: {:#}", category, e);
                Vec::new()
            }
        };
        if !from_a.is_empty() {
            return (from_a, Some(category));
        }

        let from_b = match self.catalog_b.by_category(&category, SOURCE_LIMIT).await {
            Ok(items) => to_products(items, Strategy::AiFallback, &self.currency),
            Err(e) => {
                debug!("Catalog B fallback failed for {}: {:#}", category, e);
                Vec::new()
            }
        };
        (from_b, Some(category))
    }

    /// Unfiltered catalog A top listings, the last resort.
    pub async fn safety(&self) -> Vec<Product> {
        match self.catalog_a.top(SOURCE_LIMIT).await {
            Ok(items) => to_products(items, Strategy::SafetyFallback, &self.currency),
            Err(e) => {
                debug!("Safety fallback unavailable: {:#}", e);
                Vec::new()
            }
        }
    }
}
