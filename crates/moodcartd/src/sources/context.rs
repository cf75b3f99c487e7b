//! Context-aware category search.
//!
//! The completion service picks one or two categories from the fixed
//! taxonomy given the user's emotion and the current local time, then the
//! two static catalogs are fanned out over those categories. Merge order
//! is deterministic: catalog A rows before catalog B rows, per category,
//! in the order the categories were picked.

use crate::llm::CompletionClient;
use crate::sources::catalog::{to_products, CatalogClient};
use chrono::{Datelike, Local, Timelike};
use moodcart_common::{CurrencyPolicy, Emotion, Product, Strategy};
use tracing::debug;

/// The fixed category taxonomy the completion service picks from.
pub const TAXONOMY: &[&str] = &[
    "furniture",
    "beauty",
    "laptops",
    "smartphones",
    "mens-shirts",
    "womens-dresses",
    "fragrances",
    "home-decoration",
    "groceries",
    "sports-accessories",
    "sunglasses",
    "kitchen-accessories",
    "mens-watches",
    "womens-jewellery",
    "skin-care",
];

/// Result cap for the merged fan-out.
const CONTEXT_LIMIT: usize = 6;

/// Per-category limits: catalog A first, catalog B tops up when short.
const CATALOG_A_PER_CATEGORY: usize = 3;
const CATALOG_B_PER_CATEGORY: usize = 2;

/// Local time context handed to the category prompt.
#[derive(Debug, Clone)]
pub struct LocalContext {
    pub hour: u32,
    pub day_of_week: String,
    pub month: String,
}

impl LocalContext {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            hour: now.hour(),
            day_of_week: now.format("%A").to_string(),
            month: now.format("%B").to_string(),
        }
    }
}

/// Ask the completion service for 1-2 taxonomy categories.
///
/// Anything outside the taxonomy in the reply is dropped; an unusable
/// reply yields an empty list, which the caller treats as no results.
pub async fn pick_categories(
    llm: &dyn CompletionClient,
    query: &str,
    emotion: Emotion,
    ctx: &LocalContext,
) -> Vec<String> {
    let prompt = format!(
        "Pick product categories for this shopper.\n\
         \n\
         User request: \"{query}\"\n\
         User emotion: {emotion}\n\
         Time context: {day}, {month}, {hour}:00 local time\n\
         \n\
         Consider what they asked for, what suits a {emotion} mood, and the\n\
         time of day. Do not mix unrelated categories.\n\
         \n\
         Available categories: {taxonomy}\n\
         \n\
         Respond with only 1-2 category names, comma-separated.\n\
         Example: furniture,home-decoration",
        query = query,
        emotion = emotion,
        day = ctx.day_of_week,
        month = ctx.month,
        hour = ctx.hour,
        taxonomy = TAXONOMY.join(", "),
    );

    let response = match llm.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            debug!("Context category pick unavailable: {:#}", e);
            return Vec::new();
        }
    };

    parse_categories(&response, 2)
}

/// Parse a comma-separated category reply, keeping only taxonomy members.
fn parse_categories(response: &str, max: usize) -> Vec<String> {
    response
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| TAXONOMY.contains(&c.as_str()))
        .take(max)
        .collect()
}

/// Fan the picked categories out across both catalogs.
///
/// For each category: up to [`CATALOG_A_PER_CATEGORY`] rows from catalog
/// A, then up to [`CATALOG_B_PER_CATEGORY`] from catalog B while the
/// merged list is still short of the cap. Either catalog failing only
/// costs its own rows.
pub async fn recommend(
    llm: &dyn CompletionClient,
    catalog_a: &dyn CatalogClient,
    catalog_b: &dyn CatalogClient,
    query: &str,
    emotion: Emotion,
    ctx: &LocalContext,
    policy: &CurrencyPolicy,
) -> (Vec<Product>, Vec<String>) {
    let categories = pick_categories(llm, query, emotion, ctx).await;
    if categories.is_empty() {
        return (Vec::new(), categories);
    }

    let mut merged = Vec::new();
    for category in &categories {
        match catalog_a.by_category(category, CATALOG_A_PER_CATEGORY).await {
            Ok(items) => merged.extend(to_products(items, Strategy::ContextAi, policy)),
            Err(e) => debug!("Catalog A unavailable for {}: {:#}", category, e),
        }

        if merged.len() < CONTEXT_LIMIT {
            match catalog_b.by_category(category, CATALOG_B_PER_CATEGORY).await {
                Ok(items) => merged.extend(to_products(items, Strategy::ContextAi, policy)),
                Err(e) => debug!("Catalog B unavailable for {}: {:#}", category, e),
            }
        }
    }

    merged.truncate(CONTEXT_LIMIT);
    (merged, categories)
}

/// Ask for a single fallback category for the last-ditch catalog lookup.
pub async fn pick_fallback_category(
    llm: &dyn CompletionClient,
    query: &str,
    emotion: Emotion,
) -> Option<String> {
    let prompt = format!(
        "A user said: \"{query}\" and feels {emotion}.\n\
         \n\
         Choose the single most relevant product category for them:\n\
         {taxonomy}\n\
         \n\
         Respond with only ONE category name, nothing else.",
        query = query,
        emotion = emotion,
        taxonomy = TAXONOMY.join(", "),
    );

    let response = match llm.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            debug!("Fallback category pick unavailable: {:#}", e);
            return None;
        }
    };

    let category = response
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
        .to_lowercase();

    if category.is_empty() {
        None
    } else {
        Some(category)
    }
}
