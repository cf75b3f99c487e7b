//! Analytics sink and reporting queries.
//!
//! The write side is strictly append-only: one attempt row per
//! orchestration call, one feedback row per verdict. The read side feeds
//! the stats endpoint and never influences recommendations.

use super::MarketDb;
use crate::types::{
    AnalyticsReport, FeedbackBreakdown, FeedbackEvent, MarketplaceCounters, MethodPerformance,
    SearchAttempt,
};
use anyhow::Result;
use chrono::Utc;
use rusqlite::params;

/// Reporting window for method performance, in days.
const REPORT_WINDOW_DAYS: u32 = 7;

/// How many patterns the report lists.
const REPORT_PATTERN_LIMIT: usize = 10;

impl MarketDb {
    /// Append one attempt row. Called exactly once per orchestration call.
    pub async fn record_attempt(&self, attempt: &SearchAttempt) -> Result<()> {
        let attempt = attempt.clone();
        let now = Utc::now();

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO recommendation_attempts
                     (query, emotion, strategy, products_found, latency_ms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    attempt.query,
                    attempt.emotion.as_str(),
                    attempt.strategy.as_str(),
                    attempt.products_found as i64,
                    attempt.latency_ms,
                    now
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Append one feedback row.
    pub async fn record_feedback(&self, event: &FeedbackEvent) -> Result<()> {
        let event = event.clone();
        let now = Utc::now();

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO product_feedback
                     (product_title, query, verdict, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.product_title,
                    event.query,
                    event.verdict.as_str(),
                    event.source.as_str(),
                    now
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Per-strategy usage over the last `days` days.
    pub async fn method_performance(&self, days: u32) -> Result<Vec<MethodPerformance>> {
        let window = format!("-{} days", days);

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT strategy, COUNT(*), AVG(products_found), AVG(latency_ms)
                 FROM recommendation_attempts
                 WHERE datetime(created_at) >= datetime('now', ?1)
                 GROUP BY strategy
                 ORDER BY COUNT(*) DESC",
            )?;

            let rows = stmt.query_map(params![window], |row| {
                Ok(MethodPerformance {
                    strategy: row.get(0)?,
                    uses: row.get(1)?,
                    avg_products: row.get(2)?,
                    avg_latency_ms: row.get(3)?,
                })
            })?;

            let mut methods = Vec::new();
            for row in rows {
                methods.push(row?);
            }
            Ok(methods)
        })
        .await
    }

    /// Feedback counts grouped by verdict and source.
    pub async fn feedback_breakdown(&self) -> Result<Vec<FeedbackBreakdown>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT verdict, source, COUNT(*)
                 FROM product_feedback
                 GROUP BY verdict, source
                 ORDER BY COUNT(*) DESC",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok(FeedbackBreakdown {
                    verdict: row.get(0)?,
                    source: row.get(1)?,
                    count: row.get(2)?,
                })
            })?;

            let mut breakdown = Vec::new();
            for row in rows {
                breakdown.push(row?);
            }
            Ok(breakdown)
        })
        .await
    }

    /// Marketplace-wide counters.
    pub async fn marketplace_counters(&self) -> Result<MarketplaceCounters> {
        self.execute(|conn| {
            let active_products: i64 = conn.query_row(
                "SELECT COUNT(*) FROM business_products WHERE active = 1",
                [],
                |row| row.get(0),
            )?;
            let partner_businesses: i64 =
                conn.query_row("SELECT COUNT(*) FROM businesses", [], |row| row.get(0))?;
            let total_attempts: i64 = conn.query_row(
                "SELECT COUNT(*) FROM recommendation_attempts",
                [],
                |row| row.get(0),
            )?;
            let accepted_total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM product_feedback WHERE verdict = 'accept'",
                [],
                |row| row.get(0),
            )?;

            Ok(MarketplaceCounters {
                active_products,
                partner_businesses,
                total_attempts,
                accepted_total,
            })
        })
        .await
    }

    /// Everything the stats endpoint returns, in one call.
    pub async fn analytics_report(&self) -> Result<AnalyticsReport> {
        Ok(AnalyticsReport {
            methods: self.method_performance(REPORT_WINDOW_DAYS).await?,
            feedback: self.feedback_breakdown().await?,
            top_patterns: self.top_patterns(REPORT_PATTERN_LIMIT).await?,
            counters: self.marketplace_counters().await?,
        })
    }
}
