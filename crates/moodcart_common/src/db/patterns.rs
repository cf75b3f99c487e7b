//! Success-pattern store.
//!
//! Patterns map a (query prefix, emotion) key to the categories that led to
//! an accepted product. Writes are a single upsert so concurrent accepts on
//! the same key cannot lose an increment; rows are never deleted.

use super::MarketDb;
use crate::types::{Emotion, SuccessPattern};
use anyhow::Result;
use chrono::Utc;
use rusqlite::params;
use tracing::debug;

/// How many words of the query form the pattern key.
const PREFIX_WORDS: usize = 3;

/// First [`PREFIX_WORDS`] words of the query, lowercased.
fn query_prefix(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .take(PREFIX_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a stored prefix and an incoming query share at least one token.
fn shares_token(prefix: &str, query: &str) -> bool {
    let lowered = query.to_lowercase();
    let query_tokens: Vec<&str> = lowered.split_whitespace().collect();
    prefix
        .split_whitespace()
        .any(|token| query_tokens.contains(&token))
}

impl MarketDb {
    /// Record one accepted outcome for this query and emotion.
    ///
    /// Inserts the pattern at count 1, or bumps the counter of the existing
    /// row in the same statement. The key is (prefix, emotion, categories):
    /// an accept that credits a different category list starts its own
    /// counter instead of reinforcing the old one.
    pub async fn record_success(
        &self,
        query: &str,
        emotion: Emotion,
        categories: &[String],
    ) -> Result<()> {
        let prefix = query_prefix(query);
        let joined = categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let now = Utc::now();

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO success_patterns (query_prefix, emotion, categories, success_count, last_success)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(query_prefix, emotion, categories) DO UPDATE SET
                     success_count = success_count + 1,
                     last_success = excluded.last_success",
                params![prefix, emotion.as_str(), joined, now],
            )?;
            Ok(())
        })
        .await?;

        debug!("Recorded success pattern for emotion {}", emotion);
        Ok(())
    }

    /// Best learned pattern for this query and emotion, if any.
    ///
    /// A stored pattern matches when it shares at least one word with the
    /// incoming query. Candidates come back ordered by success count, then
    /// by recency, so the first match is the winner.
    pub async fn find_pattern(
        &self,
        query: &str,
        emotion: Emotion,
    ) -> Result<Option<SuccessPattern>> {
        let query = query.to_string();

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT query_prefix, emotion, categories, success_count, last_success
                 FROM success_patterns
                 WHERE emotion = ?1
                 ORDER BY success_count DESC, datetime(last_success) DESC",
            )?;

            let rows = stmt.query_map(params![emotion.as_str()], row_to_pattern)?;

            for row in rows {
                let pattern = row?;
                if shares_token(&pattern.query_prefix, &query) {
                    return Ok(Some(pattern));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Most reinforced patterns, for the analytics report.
    pub async fn top_patterns(&self, limit: usize) -> Result<Vec<SuccessPattern>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT query_prefix, emotion, categories, success_count, last_success
                 FROM success_patterns
                 ORDER BY success_count DESC, datetime(last_success) DESC
                 LIMIT ?1",
            )?;

            let rows = stmt.query_map(params![limit as i64], row_to_pattern)?;
            let mut patterns = Vec::new();
            for row in rows {
                patterns.push(row?);
            }
            Ok(patterns)
        })
        .await
    }
}

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<SuccessPattern> {
    let emotion: String = row.get(1)?;
    let categories: String = row.get(2)?;
    Ok(SuccessPattern {
        query_prefix: row.get(0)?,
        emotion: emotion.parse().unwrap_or_default(),
        categories: categories
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        success_count: row.get(3)?,
        last_success: row.get(4)?,
    })
}
