//! Local business catalog.
//!
//! Partner businesses register inventory tagged with the emotions it suits;
//! the orchestrator checks this catalog before any remote source.

use super::MarketDb;
use crate::currency::CurrencyPolicy;
use crate::types::{Emotion, NewBusinessProduct, Product, Strategy};
use anyhow::Result;
use chrono::Utc;
use rusqlite::params;
use tracing::debug;

/// Cap on products returned from the local catalog per query.
pub const LOCAL_LIMIT: usize = 6;

impl MarketDb {
    /// Register a business, or refresh its name if the email is known.
    pub async fn upsert_business(&self, name: &str, email: &str) -> Result<i64> {
        let name = name.to_string();
        let email = email.to_string();
        let now = Utc::now();

        self.execute(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO businesses (name, email, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![name, email, now],
                |row| row.get(0),
            )?;
            Ok(id)
        })
        .await
    }

    /// Add a product to a business's inventory. Returns the product id.
    pub async fn add_product(&self, product: NewBusinessProduct) -> Result<i64> {
        let tags = product
            .emotion_tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let now = Utc::now();

        self.execute(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO business_products
                     (business_id, name, description, price, category, emotion_tags, link, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
                 RETURNING id",
                params![
                    product.business_id,
                    product.name,
                    product.description,
                    product.price,
                    product.category,
                    tags,
                    product.link,
                    now
                ],
                |row| row.get(0),
            )?;
            Ok(id)
        })
        .await
    }

    /// Active local products tagged for the emotion or matching any query
    /// word across name/description/category, newest first, capped at
    /// [`LOCAL_LIMIT`].
    pub async fn local_products(
        &self,
        query: &str,
        emotion: Emotion,
        policy: &CurrencyPolicy,
    ) -> Result<Vec<Product>> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let emotion_tag = emotion.as_str().to_string();
        let policy = policy.clone();

        let products = self
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.description, p.price, p.category, p.link,
                            p.emotion_tags, b.name
                     FROM business_products p
                     JOIN businesses b ON b.id = p.business_id
                     WHERE p.active = 1
                     ORDER BY datetime(p.created_at) DESC, p.id DESC",
                )?;

                let rows = stmt.query_map([], |row| {
                    let price: f64 = row.get(2)?;
                    let tags: String = row.get(5)?;
                    let product = Product {
                        title: row.get(0)?,
                        price: policy.format_price(price),
                        description: row.get(1)?,
                        category: row.get(3)?,
                        rating: "Local business".to_string(),
                        stock: "In stock".to_string(),
                        brand: row.get(6)?,
                        source: Strategy::LocalBusiness,
                        link: row.get(4)?,
                    };
                    Ok((product, tags))
                })?;

                let mut products = Vec::new();
                for row in rows {
                    let (product, tags) = row?;

                    let tag_match = tags
                        .split(',')
                        .map(str::trim)
                        .any(|tag| tag == emotion_tag);
                    let haystack = format!(
                        "{} {} {}",
                        product.title, product.description, product.category
                    )
                    .to_lowercase();
                    let word_match = words.iter().any(|w| haystack.contains(w.as_str()));

                    if tag_match || word_match {
                        products.push(product.clamped());
                        if products.len() == LOCAL_LIMIT {
                            break;
                        }
                    }
                }
                Ok(products)
            })
            .await?;

        debug!("Local catalog matched {} products", products.len());
        Ok(products)
    }
}
