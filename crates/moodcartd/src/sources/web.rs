//! Web search source.
//!
//! Issues one keyword search against a Custom-Search-shaped API and turns
//! hits into products. Prices are scraped out of result snippets with a
//! small ordered set of currency patterns; when none match, the product
//! carries a "See website" placeholder instead of a guessed number.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moodcart_common::config::SearchConfig;
use moodcart_common::{CurrencyPolicy, Product, Strategy};
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Price shown when no pattern matched the snippet.
pub const PRICE_SEE_WEBSITE: &str = "See website";

/// One raw search hit.
#[derive(Debug, Clone)]
pub struct WebHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Keyword web search interface.
#[async_trait]
pub trait WebSearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>>;
}

// ============================================================================
// Price extraction
// ============================================================================

/// Ordered snippet price patterns for the display currency.
///
/// Tried in order: symbol-prefixed, abbreviation-prefixed, suffixed word.
/// The abbreviation and word forms follow the default rupee market; a
/// non-matching snippet simply falls through to the placeholder.
pub struct PriceExtractor {
    patterns: Vec<Regex>,
    symbol: String,
}

impl PriceExtractor {
    pub fn new(policy: &CurrencyPolicy) -> Self {
        let symbol_pattern = format!(r"{}\s*([0-9][0-9,]*)", regex::escape(&policy.symbol));
        let patterns = [
            symbol_pattern.as_str(),
            r"(?i)\bRs\.?\s*([0-9][0-9,]*)",
            r"(?i)([0-9][0-9,]*)\s*rupees?\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Self {
            patterns,
            symbol: policy.symbol.clone(),
        }
    }

    /// Extract a display price from a snippet, first matching pattern wins.
    pub fn extract(&self, snippet: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(captures) = pattern.captures(snippet) {
                if let Some(digits) = captures.get(1) {
                    return Some(format!("{}{}", self.symbol, digits.as_str()));
                }
            }
        }
        None
    }
}

/// Cut site-name suffixes like " | Flipkart" or " - Amazon.in" off a
/// result title. Everything from the first separator on is dropped.
pub fn clean_title(title: &str) -> String {
    let cut = title.find(['|', '-']).unwrap_or(title.len());
    title[..cut].trim().to_string()
}

/// Turn search hits into products, capped at `limit`.
pub fn to_products(hits: Vec<WebHit>, extractor: &PriceExtractor, limit: usize) -> Vec<Product> {
    hits.into_iter()
        .take(limit)
        .map(|hit| {
            let price = extractor
                .extract(&hit.snippet)
                .unwrap_or_else(|| PRICE_SEE_WEBSITE.to_string());

            Product {
                title: clean_title(&hit.title),
                price,
                description: hit.snippet,
                category: "Web result".to_string(),
                rating: "See reviews online".to_string(),
                stock: "Check availability".to_string(),
                brand: "Various retailers".to_string(),
                source: Strategy::WebSearch,
                link: if hit.link.is_empty() { None } else { Some(hit.link) },
            }
            .clamped()
        })
        .collect()
}

// ============================================================================
// Production client
// ============================================================================

pub struct HttpWebSearch {
    http: reqwest::Client,
    config: SearchConfig,
}

impl HttpWebSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl WebSearchClient for HttpWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        if !self.config.is_configured() {
            debug!("Web search skipped: no API credentials configured");
            return Ok(Vec::new());
        }
        let key = self.config.api_key.trim();
        let engine_id = self.config.engine_id.trim();

        // Bias results toward shopping pages
        let search_query = format!("{} buy online price store product", query);

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("key", key),
                ("cx", engine_id),
                ("q", search_query.as_str()),
                ("num", &max_results.min(10).to_string()),
                ("gl", self.config.market.as_str()),
                ("hl", self.config.language.as_str()),
            ])
            .send()
            .await
            .context("web search request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("web search returned {}", response.status()));
        }

        let body: Value = response.json().await.context("web search response was not JSON")?;
        let items = body.get("items").and_then(Value::as_array);

        let hits = items
            .map(|items| {
                items
                    .iter()
                    .map(|item| WebHit {
                        title: item
                            .get("title")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        snippet: item
                            .get("snippet")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        link: item
                            .get("link")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }
}

// ============================================================================
// Fake search for tests
// ============================================================================

pub struct FakeWebSearch {
    hits: Vec<WebHit>,
    fail: bool,
}

impl FakeWebSearch {
    pub fn with_hits(hits: Vec<WebHit>) -> Self {
        Self { hits, fail: false }
    }

    pub fn empty() -> Self {
        Self::with_hits(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fail: true,
        }
    }
}

impl WebHit {
    /// Convenience constructor for tests.
    pub fn sample(title: &str, snippet: &str) -> Self {
        Self {
            title: title.to_string(),
            snippet: snippet.to_string(),
            link: "https://example.com/item".to_string(),
        }
    }
}

#[async_trait]
impl WebSearchClient for FakeWebSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        if self.fail {
            return Err(anyhow!("fake web search: scripted failure"));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}
