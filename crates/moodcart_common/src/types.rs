//! Core data types for moodcart.
//!
//! Everything that crosses a boundary lives here: the emotion model, the
//! product shape shared by every source, the strategy tags the orchestrator
//! records, and the request/response types of the daemon API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum title length a source may hand back, in characters.
pub const TITLE_MAX: usize = 80;

/// Maximum description length a source may hand back, in characters.
pub const DESCRIPTION_MAX: usize = 200;

// ============================================================================
// Emotion
// ============================================================================

/// Emotional state inferred from a single user utterance.
///
/// Derived fresh for every query and never persisted as primary state;
/// it is only written into analytics and pattern rows as a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Excited,
    Stressed,
    Frustrated,
    Tired,
    Sad,
    Confused,
    #[default]
    Neutral,
}

impl Emotion {
    /// Stable lowercase label used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Excited => "excited",
            Emotion::Stressed => "stressed",
            Emotion::Frustrated => "frustrated",
            Emotion::Tired => "tired",
            Emotion::Sad => "sad",
            Emotion::Confused => "confused",
            Emotion::Neutral => "neutral",
        }
    }

    /// Glyph shown next to the emotion in chat and product cards.
    pub fn glyph(&self) -> &'static str {
        match self {
            Emotion::Happy => "😊",
            Emotion::Excited => "🎉",
            Emotion::Stressed => "😰",
            Emotion::Frustrated => "😤",
            Emotion::Tired => "😴",
            Emotion::Sad => "😢",
            Emotion::Confused => "😕",
            Emotion::Neutral => "😐",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized emotion '{0}'")]
pub struct ParseEmotionError(String);

impl FromStr for Emotion {
    type Err = ParseEmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Emotion::Happy),
            "excited" => Ok(Emotion::Excited),
            "stressed" => Ok(Emotion::Stressed),
            "frustrated" => Ok(Emotion::Frustrated),
            "tired" => Ok(Emotion::Tired),
            "sad" => Ok(Emotion::Sad),
            "confused" => Ok(Emotion::Confused),
            "neutral" => Ok(Emotion::Neutral),
            other => Err(ParseEmotionError(other.to_string())),
        }
    }
}

/// An emotion paired with the classifier's confidence in it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: Emotion,
    /// In [0.0, 1.0]. Neutral readings bottom out at 0.3 rather than 0.0
    /// so downstream consumers never see a zero-confidence label.
    pub confidence: f64,
}

// ============================================================================
// Strategy
// ============================================================================

/// Which step of the recommendation chain produced a result.
///
/// The variant set is closed: every terminal state of the orchestrator maps
/// to exactly one of these, and analytics stores the `as_str` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    LocalBusiness,
    HistoricalPattern,
    SemanticAi,
    WebSearch,
    ContextAi,
    AiFallback,
    SafetyFallback,
    NoResults,
}

impl Strategy {
    /// Stable snake_case label used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LocalBusiness => "local_business",
            Strategy::HistoricalPattern => "historical_pattern",
            Strategy::SemanticAi => "semantic_ai",
            Strategy::WebSearch => "web_search",
            Strategy::ContextAi => "context_ai",
            Strategy::AiFallback => "ai_fallback",
            Strategy::SafetyFallback => "safety_fallback",
            Strategy::NoResults => "no_results",
        }
    }

    /// Short human-readable name used in rationale lines and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::LocalBusiness => "Local marketplace",
            Strategy::HistoricalPattern => "Learned pattern",
            Strategy::SemanticAi => "AI suggestion",
            Strategy::WebSearch => "Web search",
            Strategy::ContextAi => "Context pick",
            Strategy::AiFallback => "AI fallback",
            Strategy::SafetyFallback => "Popular picks",
            Strategy::NoResults => "No results",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized strategy '{0}'")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local_business" => Ok(Strategy::LocalBusiness),
            "historical_pattern" => Ok(Strategy::HistoricalPattern),
            "semantic_ai" => Ok(Strategy::SemanticAi),
            "web_search" => Ok(Strategy::WebSearch),
            "context_ai" => Ok(Strategy::ContextAi),
            "ai_fallback" => Ok(Strategy::AiFallback),
            "safety_fallback" => Ok(Strategy::SafetyFallback),
            "no_results" => Ok(Strategy::NoResults),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

// ============================================================================
// Product
// ============================================================================

/// A single product offer, normalized from whichever source produced it.
///
/// Prices are pre-formatted display strings in the configured currency;
/// sources that cannot determine a price use their own placeholder text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub rating: String,
    pub stock: String,
    pub brand: String,
    /// Which chain step produced this offer.
    pub source: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Product {
    /// Enforce the field caps every source must respect.
    pub fn clamped(mut self) -> Self {
        self.title = clamp_chars(self.title, TITLE_MAX);
        self.description = clamp_chars(self.description, DESCRIPTION_MAX);
        self
    }
}

/// Truncate to `max` characters, respecting UTF-8 boundaries.
fn clamp_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

// ============================================================================
// Learning and analytics records
// ============================================================================

/// One orchestration call, as recorded in the analytics sink.
///
/// Append-only. The orchestrator writes exactly one of these per call and
/// never reads them back; only the reporting queries do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAttempt {
    pub query: String,
    pub emotion: Emotion,
    pub strategy: Strategy,
    pub products_found: usize,
    pub latency_ms: i64,
}

/// A learned association between a query prefix, an emotion and the
/// categories that led to an accepted product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessPattern {
    /// First three words of the originating query, lowercased.
    pub query_prefix: String,
    pub emotion: Emotion,
    pub categories: Vec<String>,
    pub success_count: i64,
    pub last_success: DateTime<Utc>,
}

/// User verdict on a shown product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackVerdict {
    Accept,
    Reject,
}

impl FeedbackVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackVerdict::Accept => "accept",
            FeedbackVerdict::Reject => "reject",
        }
    }
}

impl fmt::Display for FeedbackVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized verdict '{0}' (expected accept or reject)")]
pub struct ParseVerdictError(String);

impl FromStr for FeedbackVerdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" | "yes" | "y" => Ok(FeedbackVerdict::Accept),
            "reject" | "no" | "n" => Ok(FeedbackVerdict::Reject),
            other => Err(ParseVerdictError(other.to_string())),
        }
    }
}

/// One recorded verdict on a shown product. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub product_title: String,
    pub query: String,
    pub verdict: FeedbackVerdict,
    pub source: Strategy,
}

// ============================================================================
// Orchestrator output
// ============================================================================

/// What the recommendation chain hands back: a (possibly empty) product
/// list and a rationale naming how it was found. Never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub products: Vec<Product>,
    pub rationale: String,
    pub strategy: Strategy,
    pub emotion: Emotion,
    pub confidence: f64,
}

// ============================================================================
// Daemon API
// ============================================================================

/// One prior turn of the conversation, supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    /// Recent conversation turns, oldest first. Only the last two are used.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    /// Empathetic reply text shown to the user.
    pub reply: String,
    /// One line naming how the products were found.
    pub rationale: String,
    pub strategy: Strategy,
    pub emotion: Emotion,
    pub confidence: f64,
    pub glyph: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub product_title: String,
    pub query: String,
    pub verdict: FeedbackVerdict,
    pub source: Strategy,
    /// Category of the shown product, so accepts reinforce what was
    /// actually accepted. Absent when the source had no category.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub instance_id: String,
}

// ============================================================================
// Analytics reports
// ============================================================================

/// Per-strategy usage over the reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodPerformance {
    pub strategy: String,
    pub uses: i64,
    pub avg_products: f64,
    pub avg_latency_ms: f64,
}

/// Feedback counts grouped by verdict and source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackBreakdown {
    pub verdict: String,
    pub source: String,
    pub count: i64,
}

/// Marketplace-wide counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceCounters {
    pub active_products: i64,
    pub partner_businesses: i64,
    pub total_attempts: i64,
    pub accepted_total: i64,
}

/// Everything `/v1/stats` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub methods: Vec<MethodPerformance>,
    pub feedback: Vec<FeedbackBreakdown>,
    pub top_patterns: Vec<SuccessPattern>,
    pub counters: MarketplaceCounters,
}

// ============================================================================
// Local catalog writes
// ============================================================================

/// Input for registering a product in the local marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusinessProduct {
    pub business_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Numeric price in the configured display currency.
    pub price: f64,
    pub category: String,
    /// Emotions this product suits, e.g. ["stressed", "tired"].
    #[serde(default)]
    pub emotion_tags: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_labels_round_trip() {
        for emotion in [
            Emotion::Happy,
            Emotion::Excited,
            Emotion::Stressed,
            Emotion::Frustrated,
            Emotion::Tired,
            Emotion::Sad,
            Emotion::Confused,
            Emotion::Neutral,
        ] {
            let parsed: Emotion = emotion.as_str().parse().unwrap();
            assert_eq!(parsed, emotion);
        }
    }

    #[test]
    fn test_emotion_parse_rejects_unknown() {
        assert!("cheerful".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_strategy_labels_round_trip() {
        for strategy in [
            Strategy::LocalBusiness,
            Strategy::HistoricalPattern,
            Strategy::SemanticAi,
            Strategy::WebSearch,
            Strategy::ContextAi,
            Strategy::AiFallback,
            Strategy::SafetyFallback,
            Strategy::NoResults,
        ] {
            let parsed: Strategy = strategy.as_str().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }

    #[test]
    fn test_strategy_serde_uses_snake_case() {
        let json = serde_json::to_string(&Strategy::LocalBusiness).unwrap();
        assert_eq!(json, "\"local_business\"");
    }

    #[test]
    fn test_verdict_accepts_short_forms() {
        assert_eq!("y".parse::<FeedbackVerdict>().unwrap(), FeedbackVerdict::Accept);
        assert_eq!("No".parse::<FeedbackVerdict>().unwrap(), FeedbackVerdict::Reject);
        assert!("maybe".parse::<FeedbackVerdict>().is_err());
    }

    #[test]
    fn test_product_clamping_respects_char_boundaries() {
        let product = Product {
            title: "é".repeat(100),
            price: "₹100".to_string(),
            description: "d".repeat(300),
            category: "general".to_string(),
            rating: "4.5".to_string(),
            stock: "In stock".to_string(),
            brand: "Test".to_string(),
            source: Strategy::SemanticAi,
            link: None,
        }
        .clamped();

        assert_eq!(product.title.chars().count(), TITLE_MAX);
        assert_eq!(product.description.chars().count(), DESCRIPTION_MAX);
    }

    #[test]
    fn test_clamp_leaves_short_strings_alone() {
        let s = clamp_chars("short".to_string(), TITLE_MAX);
        assert_eq!(s, "short");
    }
}
