//! Configuration management for the moodcart daemon.
//!
//! Loads settings from /etc/moodcart/config.toml or uses defaults. Every
//! field has a serde default so a partial file is always valid.

use crate::currency::CurrencyPolicy;
use crate::db::DbLocation;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/moodcart/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/moodcart/config.toml";

/// Env var naming an explicit config file (takes precedence over both paths)
pub const CONFIG_ENV: &str = "MOODCART_CONFIG";

/// Env var fallbacks for the web search credentials
pub const SEARCH_KEY_ENV: &str = "MOODCART_SEARCH_API_KEY";
pub const SEARCH_ENGINE_ENV: &str = "MOODCART_SEARCH_ENGINE_ID";

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama-compatible endpoint
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model used for all completion calls
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_llm_timeout() -> u64 {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// API key; falls back to MOODCART_SEARCH_API_KEY when empty
    #[serde(default)]
    pub api_key: String,

    /// Custom search engine id; falls back to MOODCART_SEARCH_ENGINE_ID
    #[serde(default)]
    pub engine_id: String,

    /// Geolocation bias passed to the search API
    #[serde(default = "default_search_market")]
    pub market: String,

    /// Interface language passed to the search API
    #[serde(default = "default_search_language")]
    pub language: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_search_market() -> String {
    "in".to_string()
}

fn default_search_language() -> String {
    "en".to_string()
}

fn default_search_timeout() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key: String::new(),
            engine_id: String::new(),
            market: default_search_market(),
            language: default_search_language(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    /// Fill empty credentials from the environment. Runs once at load time
    /// so the rest of the daemon sees plain config fields.
    fn apply_env(&mut self) {
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(SEARCH_KEY_ENV) {
                self.api_key = key;
            }
        }
        if self.engine_id.trim().is_empty() {
            if let Ok(id) = std::env::var(SEARCH_ENGINE_ENV) {
                self.engine_id = id;
            }
        }
    }

    /// Whether web search can be attempted at all.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.engine_id.trim().is_empty()
    }
}

/// Primary static catalog (DummyJSON-shaped API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogAConfig {
    #[serde(default = "default_catalog_a_url")]
    pub base_url: String,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

fn default_catalog_a_url() -> String {
    "https://dummyjson.com".to_string()
}

fn default_catalog_timeout() -> u64 {
    10
}

impl Default for CatalogAConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_a_url(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

/// Secondary static catalog (FakeStore-shaped API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogBConfig {
    #[serde(default = "default_catalog_b_url")]
    pub base_url: String,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

fn default_catalog_b_url() -> String {
    "https://fakestoreapi.com".to_string()
}

impl Default for CatalogBConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_b_url(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database file path; default resolves per-user
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn location(&self) -> DbLocation {
        match &self.path {
            Some(path) => DbLocation::Custom(path.clone()),
            None => DbLocation::User,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the daemon API
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7910".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub catalog_a: CatalogAConfig,

    #[serde(default)]
    pub catalog_b: CatalogBConfig,

    #[serde(default)]
    pub currency: CurrencyPolicy,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl MarketConfig {
    /// Load config from the usual places, or return defaults. Search
    /// credentials missing from the file are taken from the environment.
    pub fn load() -> Self {
        let mut config = if let Ok(path) = std::env::var(CONFIG_ENV) {
            Self::load_from_path(&path).unwrap_or_else(|e| {
                warn!("Config at {} unreadable, using defaults: {}", path, e);
                MarketConfig::default()
            })
        } else {
            Self::load_from_path(CONFIG_PATH)
                .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
                .unwrap_or_else(|e| {
                    warn!("Config not found, using defaults: {}", e);
                    MarketConfig::default()
                })
        };
        config.search.apply_env();
        config
    }

    /// Load config from specific path
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MarketConfig = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &str) -> Result<()> {
        let config = MarketConfig::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.llm.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.currency.code, "INR");
        assert_eq!(config.currency.usd_rate, 83.0);
        assert_eq!(config.server.bind, "127.0.0.1:7910");
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[llm]
model = "llama3.2:3b"

[currency]
code = "USD"
symbol = "$"
usd_rate = 1.0
"#;
        let config: MarketConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "llama3.2:3b");
        // Defaults for missing fields
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.currency.symbol, "$");
        assert_eq!(config.catalog_a.base_url, "https://dummyjson.com");
        assert_eq!(config.catalog_b.base_url, "https://fakestoreapi.com");
    }

    #[test]
    fn test_empty_toml_falls_back_to_defaults() {
        let config: MarketConfig = toml::from_str("").unwrap();
        assert_eq!(config.search.market, "in");
        assert_eq!(config.search.language, "en");
    }

    #[test]
    fn test_search_configured_needs_both_credentials() {
        let mut search = SearchConfig::default();
        assert!(!search.is_configured());

        search.api_key = "file-key".to_string();
        assert!(!search.is_configured());

        search.engine_id = "file-engine".to_string();
        assert!(search.is_configured());
    }

    #[test]
    fn test_database_location_custom() {
        let config = DatabaseConfig {
            path: Some(PathBuf::from("/tmp/market.db")),
        };
        match config.location() {
            DbLocation::Custom(p) => assert_eq!(p, PathBuf::from("/tmp/market.db")),
            other => panic!("expected custom location, got {:?}", other),
        }
    }
}
