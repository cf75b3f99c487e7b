//! MarketDb integration tests.
//!
//! Everything runs against a throwaway SQLite file; no network, no shared
//! state between tests.

use moodcart_common::{
    CurrencyPolicy, DbLocation, Emotion, FeedbackEvent, FeedbackVerdict, MarketDb,
    NewBusinessProduct, SearchAttempt, Strategy,
};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

async fn open_db() -> (MarketDb, TempDir) {
    let dir = tempdir().unwrap();
    let db = MarketDb::open(DbLocation::Custom(dir.path().join("test.db")))
        .await
        .unwrap();
    (db, dir)
}

// ============================================================================
// Pattern Store
// ============================================================================

#[tokio::test]
async fn test_record_success_inserts_at_count_one() {
    let (db, _dir) = open_db().await;

    db.record_success(
        "gift for sister",
        Emotion::Happy,
        &["womens-jewellery".to_string()],
    )
    .await
    .unwrap();

    let pattern = db
        .find_pattern("gift ideas", Emotion::Happy)
        .await
        .unwrap()
        .expect("pattern should match on the shared word");
    assert_eq!(pattern.query_prefix, "gift for sister");
    assert_eq!(pattern.success_count, 1);
    assert_eq!(pattern.categories, vec!["womens-jewellery".to_string()]);
}

#[tokio::test]
async fn test_repeat_success_bumps_single_row() {
    let (db, _dir) = open_db().await;

    db.record_success("need a lamp", Emotion::Tired, &["home-decoration".to_string()])
        .await
        .unwrap();
    db.record_success("need a lamp", Emotion::Tired, &["home-decoration".to_string()])
        .await
        .unwrap();

    let pattern = db
        .find_pattern("lamp shopping", Emotion::Tired)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pattern.success_count, 2);

    // Still exactly one row for the key
    let rows: i64 = db
        .execute(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM success_patterns", [], |r| r.get(0))?;
            Ok(n)
        })
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_distinct_categories_keep_separate_counters() {
    let (db, _dir) = open_db().await;

    db.record_success("cozy blanket please", Emotion::Sad, &["home-decoration".to_string()])
        .await
        .unwrap();
    // Same prefix and emotion but a different category list: a new row at
    // count 1, not a bump of the old association.
    db.record_success("cozy blanket please", Emotion::Sad, &["groceries".to_string()])
        .await
        .unwrap();

    let rows: i64 = db
        .execute(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM success_patterns", [], |r| r.get(0))?;
            Ok(n)
        })
        .await
        .unwrap();
    assert_eq!(rows, 2);

    // Reinforcing one of the two makes it the lookup winner.
    db.record_success("cozy blanket please", Emotion::Sad, &["groceries".to_string()])
        .await
        .unwrap();

    let pattern = db
        .find_pattern("cozy evening", Emotion::Sad)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pattern.success_count, 2);
    assert_eq!(pattern.categories, vec!["groceries".to_string()]);
}

#[tokio::test]
async fn test_concurrent_successes_all_counted() {
    let (db, _dir) = open_db().await;
    let db = Arc::new(db);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            db.record_success("running shoes size", Emotion::Excited, &["sports-accessories".to_string()])
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let pattern = db
        .find_pattern("running gear", Emotion::Excited)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pattern.success_count, 8);
}

#[tokio::test]
async fn test_no_cross_emotion_leakage() {
    let (db, _dir) = open_db().await;

    db.record_success("chocolate box deluxe", Emotion::Sad, &["groceries".to_string()])
        .await
        .unwrap();

    let missed = db
        .find_pattern("chocolate craving", Emotion::Happy)
        .await
        .unwrap();
    assert!(missed.is_none(), "pattern must only match its own emotion");
}

#[tokio::test]
async fn test_find_pattern_prefers_higher_count_then_recency() {
    use chrono::TimeZone;

    let (db, _dir) = open_db().await;

    db.record_success("coffee beans fresh", Emotion::Happy, &["groceries".to_string()])
        .await
        .unwrap();
    db.record_success("coffee mug gift", Emotion::Happy, &["kitchen-accessories".to_string()])
        .await
        .unwrap();

    // Equal counts: age the first one so recency decides.
    let old = chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    db.execute(move |conn| {
        conn.execute(
            "UPDATE success_patterns SET last_success = ?1 WHERE query_prefix = 'coffee beans fresh'",
            rusqlite::params![old],
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let winner = db
        .find_pattern("coffee", Emotion::Happy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.query_prefix, "coffee mug gift");

    // Reinforce the older pattern; count now beats recency.
    db.record_success("coffee beans fresh", Emotion::Happy, &["groceries".to_string()])
        .await
        .unwrap();
    db.execute(move |conn| {
        conn.execute(
            "UPDATE success_patterns SET last_success = ?1 WHERE query_prefix = 'coffee beans fresh'",
            rusqlite::params![old],
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let winner = db
        .find_pattern("coffee", Emotion::Happy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.query_prefix, "coffee beans fresh");
    assert_eq!(winner.success_count, 2);
}

#[tokio::test]
async fn test_find_pattern_requires_shared_word() {
    let (db, _dir) = open_db().await;

    db.record_success("urgent need help", Emotion::Stressed, &["self-care".to_string()])
        .await
        .unwrap();

    // "urgently" is not the word "urgent"
    let missed = db
        .find_pattern("urgently looking around", Emotion::Stressed)
        .await
        .unwrap();
    assert!(missed.is_none());
}

// ============================================================================
// Analytics Sink
// ============================================================================

#[tokio::test]
async fn test_method_performance_aggregates() {
    let (db, _dir) = open_db().await;

    for (found, latency) in [(2usize, 100i64), (4, 200)] {
        db.record_attempt(&SearchAttempt {
            query: "desk lamp".to_string(),
            emotion: Emotion::Neutral,
            strategy: Strategy::WebSearch,
            products_found: found,
            latency_ms: latency,
        })
        .await
        .unwrap();
    }
    db.record_attempt(&SearchAttempt {
        query: "desk lamp".to_string(),
        emotion: Emotion::Neutral,
        strategy: Strategy::LocalBusiness,
        products_found: 1,
        latency_ms: 5,
    })
    .await
    .unwrap();

    let methods = db.method_performance(7).await.unwrap();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].strategy, "web_search");
    assert_eq!(methods[0].uses, 2);
    assert_eq!(methods[0].avg_products, 3.0);
    assert_eq!(methods[0].avg_latency_ms, 150.0);
}

#[tokio::test]
async fn test_feedback_breakdown_groups_by_verdict_and_source() {
    let (db, _dir) = open_db().await;

    for _ in 0..2 {
        db.record_feedback(&FeedbackEvent {
            product_title: "Ceramic mug".to_string(),
            query: "gift".to_string(),
            verdict: FeedbackVerdict::Accept,
            source: Strategy::WebSearch,
        })
        .await
        .unwrap();
    }
    db.record_feedback(&FeedbackEvent {
        product_title: "Scented candle".to_string(),
        query: "gift".to_string(),
        verdict: FeedbackVerdict::Reject,
        source: Strategy::LocalBusiness,
    })
    .await
    .unwrap();

    let breakdown = db.feedback_breakdown().await.unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].verdict, "accept");
    assert_eq!(breakdown[0].source, "web_search");
    assert_eq!(breakdown[0].count, 2);
}

#[tokio::test]
async fn test_analytics_report_composes_all_sections() {
    let (db, _dir) = open_db().await;

    db.record_attempt(&SearchAttempt {
        query: "plant pot".to_string(),
        emotion: Emotion::Happy,
        strategy: Strategy::ContextAi,
        products_found: 3,
        latency_ms: 40,
    })
    .await
    .unwrap();
    db.record_success("plant pot ceramic", Emotion::Happy, &["home-decoration".to_string()])
        .await
        .unwrap();
    db.record_feedback(&FeedbackEvent {
        product_title: "Ceramic pot".to_string(),
        query: "plant pot".to_string(),
        verdict: FeedbackVerdict::Accept,
        source: Strategy::ContextAi,
    })
    .await
    .unwrap();

    let report = db.analytics_report().await.unwrap();
    assert_eq!(report.methods.len(), 1);
    assert_eq!(report.feedback.len(), 1);
    assert_eq!(report.top_patterns.len(), 1);
    assert_eq!(report.counters.total_attempts, 1);
    assert_eq!(report.counters.accepted_total, 1);
}

// ============================================================================
// Local Catalog
// ============================================================================

fn sample_product(business_id: i64, name: &str, tags: &[&str]) -> NewBusinessProduct {
    NewBusinessProduct {
        business_id,
        name: name.to_string(),
        description: format!("{} from a local partner", name),
        price: 499.0,
        category: "home-decoration".to_string(),
        emotion_tags: tags.iter().map(|t| t.to_string()).collect(),
        link: None,
    }
}

#[tokio::test]
async fn test_upsert_business_is_idempotent_on_email() {
    let (db, _dir) = open_db().await;

    let first = db.upsert_business("Corner Crafts", "hello@corner.example").await.unwrap();
    let second = db.upsert_business("Corner Crafts & Co", "hello@corner.example").await.unwrap();
    assert_eq!(first, second);

    let name: String = db
        .execute(move |conn| {
            let n = conn.query_row(
                "SELECT name FROM businesses WHERE id = ?1",
                rusqlite::params![first],
                |r| r.get(0),
            )?;
            Ok(n)
        })
        .await
        .unwrap();
    assert_eq!(name, "Corner Crafts & Co");
}

#[tokio::test]
async fn test_local_products_match_emotion_tag() {
    let (db, _dir) = open_db().await;
    let policy = CurrencyPolicy::default();

    let biz = db.upsert_business("Calm Corner", "calm@example.com").await.unwrap();
    db.add_product(sample_product(biz, "Weighted blanket", &["stressed", "tired"]))
        .await
        .unwrap();

    // Query keyword matches nothing; the emotion tag still does.
    let products = db
        .local_products("xyzzy", Emotion::Stressed, &policy)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].source, Strategy::LocalBusiness);
    assert_eq!(products[0].brand, "Calm Corner");
    assert_eq!(products[0].price, "₹499");
}

#[tokio::test]
async fn test_local_products_match_keyword() {
    let (db, _dir) = open_db().await;
    let policy = CurrencyPolicy::default();

    let biz = db.upsert_business("Bright Home", "bright@example.com").await.unwrap();
    db.add_product(sample_product(biz, "Warm reading lamp", &[]))
        .await
        .unwrap();

    let products = db
        .local_products("lamp", Emotion::Neutral, &policy)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Warm reading lamp");
}

#[tokio::test]
async fn test_local_products_skip_inactive_and_cap_at_limit() {
    let (db, _dir) = open_db().await;
    let policy = CurrencyPolicy::default();

    let biz = db.upsert_business("Big Shop", "big@example.com").await.unwrap();
    let mut last_id = 0;
    for i in 0..8 {
        last_id = db
            .add_product(sample_product(biz, &format!("Candle no {}", i), &["sad"]))
            .await
            .unwrap();
    }
    // Deactivate the newest one
    db.execute(move |conn| {
        conn.execute(
            "UPDATE business_products SET active = 0 WHERE id = ?1",
            rusqlite::params![last_id],
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let products = db.local_products("candle", Emotion::Sad, &policy).await.unwrap();
    assert_eq!(products.len(), 6);
    // Newest active first
    assert_eq!(products[0].title, "Candle no 6");
    assert!(products.iter().all(|p| p.title != "Candle no 7"));
}
