//! Database connection management for the market store.
//!
//! One SQLite connection behind an async mutex; statements run on the
//! blocking pool. WAL mode keeps readers cheap while the daemon writes
//! attempts and feedback from concurrent requests.

mod analytics;
mod businesses;
mod patterns;

pub use businesses::LOCAL_LIMIT;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Database location based on execution mode
#[derive(Debug, Clone)]
pub enum DbLocation {
    /// User mode: $XDG_DATA_HOME/moodcart/market.db or ~/.local/share/moodcart/market.db
    User,
    /// Explicit path from config, or a temp dir in tests
    Custom(PathBuf),
}

impl DbLocation {
    pub fn path(&self) -> Result<PathBuf> {
        match self {
            DbLocation::User => {
                // Try XDG_DATA_HOME first, fall back to ~/.local/share
                let base_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
                    PathBuf::from(xdg_data)
                } else if let Ok(home) = std::env::var("HOME") {
                    PathBuf::from(home).join(".local/share")
                } else {
                    anyhow::bail!("Could not determine user data directory");
                };
                Ok(base_dir.join("moodcart").join("market.db"))
            }
            DbLocation::Custom(path) => Ok(path.clone()),
        }
    }
}

/// SQLite-backed store for success patterns, feedback, recommendation
/// attempts and the local business catalog.
pub struct MarketDb {
    conn: Arc<Mutex<Connection>>,
}

impl MarketDb {
    /// Open or create the database at the specified location
    pub async fn open(location: DbLocation) -> Result<Self> {
        let db_path = location.path()?;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        info!("Opening market database at: {}", db_path.display());

        // Open connection in blocking context
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&db_path).context("Failed to open SQLite database")?;

            // Enable WAL mode for better concurrency
            conn.pragma_update(None, "journal_mode", "WAL")
                .context("Failed to enable WAL mode")?;

            conn.pragma_update(None, "synchronous", "NORMAL")
                .context("Failed to set synchronous mode")?;

            conn.pragma_update(None, "foreign_keys", "ON")
                .context("Failed to enable foreign keys")?;

            Ok(conn)
        })
        .await??;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn initialize_schema(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.blocking_lock();

            // Partner businesses and their inventory
            conn.execute(
                "CREATE TABLE IF NOT EXISTS businesses (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    created_at DATETIME NOT NULL
                )",
                [],
            )?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS business_products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    business_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    price REAL NOT NULL,
                    category TEXT NOT NULL DEFAULT 'general',
                    emotion_tags TEXT NOT NULL DEFAULT '',
                    stock INTEGER NOT NULL DEFAULT 1,
                    link TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    created_at DATETIME NOT NULL,
                    FOREIGN KEY(business_id) REFERENCES businesses(id)
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_products_active
                 ON business_products(active, created_at)",
                [],
            )?;

            // User verdicts on shown products (append-only)
            conn.execute(
                "CREATE TABLE IF NOT EXISTS product_feedback (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    product_title TEXT NOT NULL,
                    query TEXT NOT NULL,
                    verdict TEXT NOT NULL,
                    source TEXT NOT NULL,
                    created_at DATETIME NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_feedback_created
                 ON product_feedback(created_at)",
                [],
            )?;

            // One row per orchestration call (append-only)
            conn.execute(
                "CREATE TABLE IF NOT EXISTS recommendation_attempts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    query TEXT NOT NULL,
                    emotion TEXT NOT NULL,
                    strategy TEXT NOT NULL,
                    products_found INTEGER NOT NULL,
                    latency_ms INTEGER NOT NULL,
                    created_at DATETIME NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_attempts_created
                 ON recommendation_attempts(created_at)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_attempts_strategy
                 ON recommendation_attempts(strategy)",
                [],
            )?;

            // Learned (query prefix, emotion) -> categories associations
            conn.execute(
                "CREATE TABLE IF NOT EXISTS success_patterns (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    query_prefix TEXT NOT NULL,
                    emotion TEXT NOT NULL,
                    categories TEXT NOT NULL DEFAULT '',
                    success_count INTEGER NOT NULL DEFAULT 1,
                    last_success DATETIME NOT NULL
                )",
                [],
            )?;

            // The upsert in record_success conflicts on this key. Categories
            // are part of it: the same prefix and emotion can earn separate
            // counters for different category lists.
            conn.execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_pattern_key
                 ON success_patterns(query_prefix, emotion, categories)",
                [],
            )?;

            Ok(())
        })
        .await??;

        info!("Market database schema ready");
        Ok(())
    }

    /// Execute a query in a blocking context
    pub async fn execute<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_creation() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let location = DbLocation::Custom(db_path.clone());

        let db = MarketDb::open(location).await.unwrap();

        // Verify database file was created
        assert!(db_path.exists());

        // Verify we can execute queries
        let count = db
            .execute(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .unwrap();

        // businesses, business_products, product_feedback,
        // recommendation_attempts, success_patterns
        assert!(count >= 5);
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let _db = MarketDb::open(DbLocation::Custom(db_path.clone()))
                .await
                .unwrap();
        }
        let db = MarketDb::open(DbLocation::Custom(db_path)).await.unwrap();

        let has_pattern_index = db
            .execute(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type='index' AND name='idx_pattern_key'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
            .unwrap();
        assert!(has_pattern_index);
    }
}
