//! Semantic product generation.
//!
//! Asks the completion service to synthesize plausible products for a
//! free-text request. The model's output is untrusted: fences are
//! stripped, the array is parsed defensively, every field is truncated to
//! its cap, and any parse failure yields an empty list.

use crate::llm::{extract_json_array, strip_code_fences, CompletionClient};
use moodcart_common::{CurrencyPolicy, Product, Strategy};
use serde_json::Value;
use tracing::debug;

/// Generate up to `limit` products for the query.
pub async fn generate(
    llm: &dyn CompletionClient,
    query: &str,
    limit: usize,
    policy: &CurrencyPolicy,
) -> Vec<Product> {
    let prompt = build_prompt(query, limit, policy);

    let response = match llm.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            debug!("Semantic generation unavailable: {:#}", e);
            return Vec::new();
        }
    };

    parse_products(&response, limit, policy)
}

fn build_prompt(query: &str, limit: usize, policy: &CurrencyPolicy) -> String {
    format!(
        "A user is looking for: \"{query}\"\n\
         \n\
         Suggest {limit} realistic, relevant products that match their need.\n\
         For each product provide:\n\
         - title: clear product name\n\
         - price: realistic market price as a number in {code}\n\
         - description: helpful description, 100-150 characters\n\
         - category: best-fit category label\n\
         \n\
         Respond with ONLY a JSON array, no prose:\n\
         [{{\"title\": \"...\", \"price\": 2499, \"description\": \"...\", \"category\": \"...\"}}]",
        query = query,
        limit = limit,
        code = policy.code,
    )
}

/// Parse a completion response into products. Anything malformed, from a
/// missing array to a non-object entry, degrades to fewer (or zero) rows.
fn parse_products(response: &str, limit: usize, policy: &CurrencyPolicy) -> Vec<Product> {
    let stripped = strip_code_fences(response);
    let Some(array_text) = extract_json_array(stripped) else {
        debug!("Semantic response contained no JSON array");
        return Vec::new();
    };

    let entries: Vec<Value> = match serde_json::from_str(array_text) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Semantic response failed to parse: {}", e);
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| entry_to_product(entry, policy))
        .take(limit)
        .collect()
}

fn entry_to_product(entry: &Value, policy: &CurrencyPolicy) -> Option<Product> {
    let title = entry.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }

    let text = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let category = {
        let c = text("category");
        if c.is_empty() { "general".to_string() } else { c }
    };

    Some(
        Product {
            title: title.to_string(),
            price: policy.normalize_generated(entry.get("price")),
            description: text("description"),
            category,
            rating: "AI curated".to_string(),
            stock: "Available".to_string(),
            brand: "AI Curated".to_string(),
            source: Strategy::SemanticAi,
            link: None,
        }
        .clamped(),
    )
}
