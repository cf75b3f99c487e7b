//! Static catalog clients.
//!
//! Two fixed external catalogs behind one trait: catalog A is a
//! DummyJSON-shaped API, catalog B a FakeStore-shaped one. Both hand back
//! raw rows quoted in USD; conversion into the display currency happens
//! in [`to_products`] so neither client knows about exchange rates.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moodcart_common::config::{CatalogAConfig, CatalogBConfig};
use moodcart_common::{CurrencyPolicy, Product, Strategy};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// A raw catalog row before normalization.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub title: String,
    pub description: String,
    /// Upstream price in USD.
    pub price_usd: f64,
    pub category: String,
    pub rating: String,
    pub stock: String,
    pub brand: String,
}

/// Read-only interface of a static product catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Keyword search.
    async fn by_query(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>>;

    /// Exact category lookup.
    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<CatalogItem>>;

    /// Unfiltered top listings, for the safety fallback.
    async fn top(&self, limit: usize) -> Result<Vec<CatalogItem>>;
}

/// Normalize raw catalog rows into the common product shape.
///
/// The strategy tag is the chain step that requested the rows, not the
/// catalog itself: the same catalog serves pattern fan-outs, context
/// picks and fallbacks.
pub fn to_products(items: Vec<CatalogItem>, tag: Strategy, policy: &CurrencyPolicy) -> Vec<Product> {
    items
        .into_iter()
        .map(|item| {
            Product {
                title: item.title,
                price: policy.convert_usd(item.price_usd),
                description: item.description,
                category: item.category,
                rating: item.rating,
                stock: item.stock,
                brand: item.brand,
                source: tag,
                link: None,
            }
            .clamped()
        })
        .collect()
}

// ============================================================================
// Catalog A — DummyJSON-shaped API
// ============================================================================

pub struct HttpCatalogA {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogA {
    pub fn new(config: &CatalogAConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, url: String) -> Result<Vec<CatalogItem>> {
        debug!("Catalog A request: {}", url);
        let response = self.http.get(&url).send().await.context("catalog A request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("catalog A returned {}", response.status()));
        }

        let body: Value = response.json().await.context("catalog A response was not JSON")?;
        let products = body
            .get("products")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("catalog A response missing 'products' array"))?;

        Ok(products.iter().map(parse_item_a).collect())
    }
}

fn parse_item_a(raw: &Value) -> CatalogItem {
    let field = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let rating = raw
        .get("rating")
        .and_then(Value::as_f64)
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "Unrated".to_string());

    let stock = raw
        .get("stock")
        .and_then(Value::as_i64)
        .map(|s| if s > 0 { format!("{} in stock", s) } else { "Limited stock".to_string() })
        .unwrap_or_else(|| "Check availability".to_string());

    let brand = raw
        .get("brand")
        .and_then(Value::as_str)
        .filter(|b| !b.is_empty())
        .unwrap_or("Catalog")
        .to_string();

    CatalogItem {
        title: field("title"),
        description: field("description"),
        price_usd: raw.get("price").and_then(Value::as_f64).unwrap_or(0.0),
        category: field("category"),
        rating,
        stock,
        brand,
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogA {
    async fn by_query(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        let url = format!(
            "{}/products/search?q={}&limit={}",
            self.base_url,
            urlencode(query),
            limit
        );
        self.fetch(url).await
    }

    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        let url = format!(
            "{}/products/category/{}?limit={}",
            self.base_url,
            urlencode(category),
            limit
        );
        self.fetch(url).await
    }

    async fn top(&self, limit: usize) -> Result<Vec<CatalogItem>> {
        let url = format!("{}/products?limit={}", self.base_url, limit);
        self.fetch(url).await
    }
}

// ============================================================================
// Catalog B — FakeStore-shaped API
// ============================================================================

/// Source taxonomy -> catalog B's own category names. Catalog B only has
/// four categories, so everything unmapped lands on electronics.
const CATEGORY_MAP_B: &[(&str, &str)] = &[
    ("beauty", "electronics"),
    ("furniture", "men's clothing"),
    ("laptops", "electronics"),
    ("smartphones", "electronics"),
    ("mens-shirts", "men's clothing"),
    ("womens-dresses", "women's clothing"),
    ("womens-jewellery", "jewelery"),
    ("fragrances", "electronics"),
    ("home-decoration", "electronics"),
];

const CATEGORY_B_DEFAULT: &str = "electronics";

fn map_category_b(category: &str) -> &str {
    CATEGORY_MAP_B
        .iter()
        .find(|(from, _)| *from == category)
        .map(|(_, to)| *to)
        .unwrap_or(CATEGORY_B_DEFAULT)
}

pub struct HttpCatalogB {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogB {
    pub fn new(config: &CatalogBConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, url: String) -> Result<Vec<CatalogItem>> {
        debug!("Catalog B request: {}", url);
        let response = self.http.get(&url).send().await.context("catalog B request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("catalog B returned {}", response.status()));
        }

        let body: Value = response.json().await.context("catalog B response was not JSON")?;
        let products = body
            .as_array()
            .ok_or_else(|| anyhow!("catalog B response was not an array"))?;

        Ok(products.iter().map(parse_item_b).collect())
    }
}

fn parse_item_b(raw: &Value) -> CatalogItem {
    let field = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let rating = raw
        .get("rating")
        .and_then(|r| r.get("rate"))
        .and_then(Value::as_f64)
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "Unrated".to_string());

    CatalogItem {
        title: field("title"),
        description: field("description"),
        price_usd: raw.get("price").and_then(Value::as_f64).unwrap_or(0.0),
        category: field("category"),
        rating,
        stock: "In stock".to_string(),
        brand: "Alternative Store".to_string(),
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogB {
    async fn by_query(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        // No search endpoint upstream; filter the full listing locally.
        let items = self.fetch(format!("{}/products", self.base_url)).await?;
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(items
            .into_iter()
            .filter(|item| {
                let haystack = format!("{} {}", item.title, item.description).to_lowercase();
                words.iter().any(|w| haystack.contains(w.as_str()))
            })
            .take(limit)
            .collect())
    }

    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        let mapped = map_category_b(category);
        let url = format!("{}/products/category/{}", self.base_url, urlencode(mapped));
        let items = self.fetch(url).await?;
        Ok(items.into_iter().take(limit).collect())
    }

    async fn top(&self, limit: usize) -> Result<Vec<CatalogItem>> {
        let items = self.fetch(format!("{}/products", self.base_url)).await?;
        Ok(items.into_iter().take(limit).collect())
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(ch),
            ' ' => out.push_str("%20"),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

// ============================================================================
// Fake catalog for tests
// ============================================================================

/// Scripted catalog: rows per category plus a flat list for query/top
/// lookups. A failing fake errors on every call.
pub struct FakeCatalog {
    by_category: HashMap<String, Vec<CatalogItem>>,
    flat: Vec<CatalogItem>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn empty() -> Self {
        Self {
            by_category: HashMap::new(),
            flat: Vec::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    pub fn with_category(mut self, category: &str, items: Vec<CatalogItem>) -> Self {
        self.by_category.insert(category.to_string(), items);
        self
    }

    /// Rows returned from keyword search and the unfiltered top listing.
    pub fn with_flat(mut self, items: Vec<CatalogItem>) -> Self {
        self.flat = items;
        self
    }

    /// Every lookup made, e.g. "category:laptops" or "top".
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CatalogItem {
    /// Convenience constructor for tests.
    pub fn sample(title: &str, category: &str, price_usd: f64) -> Self {
        Self {
            title: title.to_string(),
            description: format!("{} description", title),
            price_usd,
            category: category.to_string(),
            rating: "4.0".to_string(),
            stock: "In stock".to_string(),
            brand: "Sample".to_string(),
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn by_query(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        self.log(format!("query:{}", query));
        if self.fail {
            return Err(anyhow!("fake catalog: scripted failure"));
        }
        Ok(self.flat.iter().take(limit).cloned().collect())
    }

    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        self.log(format!("category:{}", category));
        if self.fail {
            return Err(anyhow!("fake catalog: scripted failure"));
        }
        Ok(self
            .by_category
            .get(category)
            .map(|items| items.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn top(&self, limit: usize) -> Result<Vec<CatalogItem>> {
        self.log("top".to_string());
        if self.fail {
            return Err(anyhow!("fake catalog: scripted failure"));
        }
        Ok(self.flat.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_map_b_known_and_default() {
        assert_eq!(map_category_b("womens-jewellery"), "jewelery");
        assert_eq!(map_category_b("furniture"), "men's clothing");
        assert_eq!(map_category_b("groceries"), "electronics");
    }

    #[test]
    fn test_to_products_converts_and_tags() {
        let policy = CurrencyPolicy::default();
        let items = vec![CatalogItem::sample("Desk Lamp", "furniture", 10.0)];
        let products = to_products(items, Strategy::ContextAi, &policy);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].source, Strategy::ContextAi);
        assert_eq!(products[0].price, "₹830");
    }

    #[test]
    fn test_to_products_clamps_long_fields() {
        let policy = CurrencyPolicy::default();
        let mut item = CatalogItem::sample("x", "general", 1.0);
        item.title = "t".repeat(120);
        item.description = "d".repeat(400);

        let products = to_products(vec![item], Strategy::AiFallback, &policy);
        assert_eq!(products[0].title.chars().count(), 80);
        assert_eq!(products[0].description.chars().count(), 200);
    }

    #[test]
    fn test_parse_item_a_handles_missing_fields() {
        let raw = serde_json::json!({"title": "Thing", "price": 5.5});
        let item = parse_item_a(&raw);
        assert_eq!(item.title, "Thing");
        assert_eq!(item.price_usd, 5.5);
        assert_eq!(item.rating, "Unrated");
        assert_eq!(item.brand, "Catalog");
    }

    #[test]
    fn test_parse_item_b_reads_nested_rating() {
        let raw = serde_json::json!({
            "title": "Shirt",
            "price": 12.0,
            "category": "men's clothing",
            "rating": {"rate": 4.35, "count": 12}
        });
        let item = parse_item_b(&raw);
        assert_eq!(item.rating, "4.3");
        assert_eq!(item.brand, "Alternative Store");
    }

    #[test]
    fn test_urlencode_spaces_and_unicode() {
        assert_eq!(urlencode("mens-shirts"), "mens-shirts");
        assert_eq!(urlencode("home decor"), "home%20decor");
        assert_eq!(urlencode("café"), "caf%C3%A9");
    }

    #[tokio::test]
    async fn test_fake_catalog_records_calls() {
        let fake = FakeCatalog::empty()
            .with_category("laptops", vec![CatalogItem::sample("Laptop", "laptops", 500.0)]);

        let items = fake.by_category("laptops", 3).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(fake.by_category("unknown", 3).await.unwrap().is_empty());
        assert_eq!(fake.calls(), vec!["category:laptops", "category:unknown"]);
    }

    #[tokio::test]
    async fn test_fake_catalog_failure_mode() {
        let fake = FakeCatalog::failing();
        assert!(fake.top(6).await.is_err());
    }
}
